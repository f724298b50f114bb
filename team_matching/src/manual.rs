/*!

This is the long-form manual for `team_matching` and `peerteams`.

## Input formats

The survey is a table with one row per respondent:
* one column names the respondent (by default `Кто Вы?`)
* one column per person to rate. The header contains the question (by default
  `Поставьте оценку тому, с кем Вы работали в команде.`) and the name of the
  rated person between square brackets: `... [Anna]`.

Cells are numbers. A blank cell means that no rating was given. A respondent
rating themselves is ignored. If the same respondent answered twice, the later
row wins.

The following providers are supported:
* `csv` Comma Separated Values, with the header on the first line
* `xlsx` Excel workbooks, such as the exports of Google Forms and Microsoft Forms.
  The worksheet can be selected by name, otherwise the workbook must contain a
  single worksheet.

## Rankings

Every participant ranks all the others. Two rules are available:
* `mutualAverage` ranks a pair by the average of the two ratings of the pair
* `opinionAndReputation` ranks by the own rating times ten, plus the
  reputation of the rated person: the sum of the ratings they received divided
  by the number of participants.

Missing ratings count as the default rating, 4.5 unless configured otherwise
(5 is the other common choice).

Equal scores are ordered by declaration order, or by a seeded hash of the
names with the `hashed` tiebreak mode. This order does not mean anything, it
only makes the outcome reproducible.

## Matching

Teams have a target size, the anchor of the team included.

`anchorLed`: the participants are sorted by reputation. The first one with room
left in their team pulls their favourite participant that is still available,
until at most one participant is left with room in their team.

`proposerLed`: free participants, first come first served, ask their favourite
participant that is not already a member of a team. The asked participant
becomes the anchor of a team. When a team is full, each candidate is scored by
how the others in the team rank them. The least desirable member is replaced
by the newcomer only if the newcomer scores strictly higher and the team as a
whole gains. The replaced member goes back to the end of the queue.

A participant that has asked everybody without success stays on their own.

The loop is bounded by an iteration cap (`maxIterations`, by default four times
the square of the number of participants). Reaching it is reported as an error
along with the teams formed so far.

## Output

Teams are numbered in the order in which they were formed. The people who
could not be placed come last, each in their own leftover team.

```text
Team 1 (2): Bob, Anna
Team 2 (2): Dan, Clara
Team 3 (1): Eve
```

The JSON summary contains the same teams, the people who ran out of
preferences, the replacements, and optionally the preference rankings.

*/
