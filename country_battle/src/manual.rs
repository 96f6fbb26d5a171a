/*!

This is the long-form manual for `country_battle` and `clash`.

## Datasets

The statistics are read from a table with one row per country. The following formats are supported:
* `csv` Comma Separated Values, the first line being the header
* `xlsx` Excel workbooks, the first row of the worksheet being the header

Two flavours of columns are recognized out of the box:
* the raw factbook export (`Country`, `Economy: Real GDP (purchasing power parity)`,
`Military and Security: Military expenditures`, `People and Society: Literacy - total population`,
`People and Society: Birth rate`, `People and Society: Death rate`)
* the cleaned export (`Country`, `gdp`, `military`, `literacy`, `birth`, `death`)

Other names can be given in the `columns` section of the configuration.

The cells do not need to be clean numbers: the first number found in the cell is used, and
thousands separators are ignored. `$24.861 trillion (2021 est.)` is read as `24.861`.
Empty cells, and cells without a number, are read as `0`. A warning is printed for each cell
that could not be read.

## Strategies

### `formula`

Each country gets a score:

```text
score = 0.30 * (gdp / gdpMax)
      + 0.25 * (military / militaryMax)
      + 0.20 * (literacy / 100)
      + 0.15 * (birth / birthMax)
      + 0.10 * (1 - death / deathMax)
```

The first country wins only if its score is strictly greater. In case of a tie, the
second country wins.

### `model`

The differences of the statistics (first country minus second country) are passed to a
trained classifier, after an optional scaler. A label of `1` means that the first country wins,
any other label that the second country wins.

Classifiers are stored as JSON files:

```json
{ "kind": "linear", "coefficients": [0.001, 0.4, 0.05, -0.1, -0.2], "intercept": 0.0 }
```

```json
{ "kind": "tree",
  "nodes": [
    { "feature": 0, "threshold": 0.0, "left": 1, "right": 2 },
    { "label": 0 },
    { "label": 1 }
  ] }
```

In a tree, the root is the first node and each split goes to `left` when the value of the
feature is lower or equal to the threshold. The features are numbered in the order
`gdp`, `military`, `literacy`, `birth`, `death`.

Scalers are stored as `{ "mean": [...], "scale": [...] }`.

## Session configuration

```json
{
  "outputSettings": { "sessionName": "Friday night", "historySize": 5 },
  "dataSource": { "provider": "csv", "filePath": "countries.csv" },
  "strategy": { "mode": "formula", "gdpMax": 30000 },
  "battles": [
    { "countryA": "France", "countryB": "Germany" },
    { "countryA": "Chile", "countryB": "Peru" }
  ]
}
```

The paths are relative to the configuration file.

*/
