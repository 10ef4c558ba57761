/*!

This is the long-form manual for `thesis_quiz` and the `metawahl` command line tool.

## Concepts

A **thesis** is a yes/no policy statement from a voting advice application. Before the
election, every party declared a **position** on it: pro, neutral or contra, often with a
short rationale. After the election, the **results** give each party a share of the votes.

Joining the two answers the question: how did the electorate vote on this thesis? The
share of voters that chose a party in favour is the pro ratio, the share that chose a
party against it is the contra ratio.

## Merging positions with results

[`merge`](crate::merge()) produces one entry per result row. Each row takes the
position of its own party. If the party has none, the position of its **linked party**
is used. Linked parties model blocs: the results may list `CDU` and `CSU` separately
while the voting advice application only asked `CDU/CSU`. Both rows then carry the
bloc position with their own vote share, and together they weigh as much as the bloc.

A row whose party has no position at all is marked `missing`. This is not the same as
neutral and is displayed separately.

## The verdict

[`classify`](crate::classify()) sums the shares:

| condition                 | verdict |
|---------------------------|---------|
| pro ratio > 50            | pro     |
| otherwise contra ratio < 50 | neutral |
| otherwise                 | contra  |

Note that contra wins an exact 50/50 split while pro needs a strict majority.

## Quiz

The quiz asks the visitor to guess the verdict of theses. [`select`](crate::select())
only keeps theses where both sides got more than 15% of the votes and one side has the
majority, ordered by thesis id and limited to 20 questions.

A [`QuizSession`](crate::QuizSession) then walks through the questions:

```text
Active --answer--> Answered(i) --advance--> Active ... --advance--> Complete
```

Calling `answer` twice for the same question, or `advance` before answering, is an
`InvalidTransition` error and leaves the session unchanged. Each answer is reported once
to the tally service; reporting never blocks the quiz and failures are only logged.

After answering, the session tells how many earlier visitors picked the right side, but
only when more than 5 of them answered that question.

## Input format

The `metawahl` tool reads the JSON served by the read API:

```text
{
  "data": {
    "id": 44,
    "title": "Landtagswahl Hessen 2018",
    "territory": "hessen",
    "date": "2018-10-28",
    "results": {
      "CDU": { "votes": 776910, "pct": 27.0 },
      "FREIE WÄHLER": { "votes": 86416, "pct": 3.0, "linked_position": "FW" }
    }
  },
  "theses": [
    {
      "id": "WOM-044-01",
      "text": "...",
      "positions": [ { "party": "CDU", "value": 1, "text": "..." } ]
    }
  ]
}
```

Position values are `1` (pro), `0` (neutral) and `-1` (contra). Result rows or positions
that cannot be read are skipped with a warning; the rest of the election is still used.

## Configuration

The tool accepts an optional JSON configuration file:

```text
{
  "apiRoot": "https://api.example.org/api/v1",
  "cacheDirectory": ".metawahl-cache",
  "reportTimeoutSecs": 5,
  "quizRules": {
    "questionLimit": 20,
    "contestedMinimumPct": 15,
    "minimumCommunitySample": 5
  }
}
```

All fields are optional. Command line flags take precedence over the file.

 */
