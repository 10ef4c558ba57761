/*!
Position and result aggregation for elections with voting advice data.

The crate joins the positions parties took on policy theses with the results of an
election, derives the majority opinion of the electorate on every thesis, and runs a
quiz in which visitors guess these majorities.

```
use thesis_quiz::*;

let results = vec![PartyResult::new("A", 60.0), PartyResult::new("B", 40.0)];
let positions = vec![
    PositionRecord { party: "A".to_string(), value: Stance::Pro, text: None },
    PositionRecord { party: "B".to_string(), value: Stance::Contra, text: None },
];
let opinion = classify(&merge(&positions, &results));
assert_eq!(opinion.verdict, Stance::Pro);
assert_eq!(opinion.ratio_pro, 60.0);
```

See the [manual] for the details of each step.
*/

mod config;
mod merge;
mod opinion;
mod selection;
mod session;
mod table;

pub mod builder;
pub mod manual;

pub use crate::config::*;
pub use crate::merge::{group_positions, merge, merge_theses, PositionGroups};
pub use crate::opinion::{classify, MAJORITY_PCT};
pub use crate::selection::{is_quiz_worthy, select, select_with_rules};
pub use crate::session::{community_agreement_ratio, QuizBackend, QuizSession};
pub use crate::table::PartyResultTable;
