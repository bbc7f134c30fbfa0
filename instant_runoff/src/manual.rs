/*!

This is the long-form manual for `instant_runoff` and `rcvtally`.

## Tabulation

Every voter ranks some or all of the candidates (rank 1 is the favourite).
The tabulation proceeds in rounds:

1. Each ballot counts for its most preferred candidate still running.
   A ballot whose ranked candidates were all eliminated (or which only ranks
   unknown candidates) is *exhausted*: it counts for nobody in this round and
   does not take part in the total.
2. If a candidate holds at least `floor(total / 2) + 1` votes, it is elected and
   the tabulation stops. This round is recorded with a `winner`.
3. Otherwise the candidate with the fewest votes is eliminated, and the
   round is recorded with the `eliminated` candidate.
4. When only one candidate remains, it is declared the winner. No extra round
   is recorded for this case: the winner only appears in the final result.

The tabulation never runs more than 100 rounds by default. If this limit is
reached, the result has no winner and must be considered inconclusive.

### Ties

When several candidates share the lowest count, the default rule eliminates
the one with the **smallest id**. This rule is reproducible, but it is not
fair: a candidate registered early (with a small id) loses every tie. Please
mention this limitation when publishing results.

An alternative rule orders the tied candidates with the SHA-256 hash of a
public seed, the round number and the candidate id (`"tiebreakMode": "random"`
with a `"randomSeed"`). The outcome is still reproducible by anyone knowing the
seed.

### Duplicates

A candidate ranked several times on the same ballot is not rejected: the best
rank is used and the others never matter.

`rcvtally` counts every stored ballot, even the ones the
[crate::builder::Builder] would refuse (no ranking, rank 0, a rank used
twice). They are reported in the log with their id. A ballot without ranking
is exhausted from the first round.

## Input formats

### `json`

The format returned by the vote storage:

```text
{
  "contestants": [ { "id": 1, "name": "Alice", "description": "..." }, ... ],
  "ballots": [
    { "id": 12, "rankings": [ { "contestantId": 1, "rank": 1 }, { "contestantId": 3, "rank": 2 } ] },
    ...
  ]
}
```

The contestants may carry any other field (description, image...). They are
copied as is into the results. Unknown fields on ballots are ignored.

### `csv`

One ranking per line. The lines of a ballot share the same ballot id and do
not need to be consecutive or sorted.

```text
ballotId,contestantId,rank
v1,1,1
v1,2,2
v2,2,1
```

The names of the columns can be changed in the configuration with the
`ballotIdColumn`, `contestantIdColumn` and `rankColumn` options.

## Configuration

```text
{
  "outputSettings": { "contestName": "Best pie", "outputDirectory": "output" },
  "ballotSources": [ { "provider": "csv", "filePath": "ballots.csv" } ],
  "contestants": [ { "id": 1, "name": "Apple" }, { "id": 2, "name": "Cherry" } ],
  "rules": { "tiebreakMode": "lowestId", "maxRounds": 100 }
}
```

## Output

```text
{
  "config": { "contest": "Best pie" },
  "results": {
    "rounds": [ { "round": 1, "votes": { "1": 3, "2": 2 }, "winner": 1, "totalVotes": 5, "exhausted": 0 } ],
    "winner": { "id": 1, "name": "Apple" },
    "totalBallots": 5
  },
  "contestants": [ { "id": 1, "name": "Apple" }, { "id": 2, "name": "Cherry" } ],
  "totalVotes": 5
}
```

When no ballot was found, `results` is `null` and a `message` explains why.

*/
