use crate::config::*;

/// Share of the votes above which (or from which, for contra) a side holds the majority.
pub const MAJORITY_PCT: f64 = 50.0;

/// Derives the vote-weighted opinion from the merged entries of one thesis.
///
/// `ratio_pro` and `ratio_contra` sum the vote shares of the rows with that position;
/// neutral and missing rows count for neither side.
///
/// The verdict is pro when `ratio_pro > 50`, neutral when `ratio_contra < 50`, and contra
/// otherwise. The two sides are not treated alike: pro needs strictly more than half,
/// contra wins at exactly half. An even 50/50 split is therefore contra. Do not make
/// the comparison symmetric.
pub fn classify(entries: &[MergedPartyEntry]) -> ThesisOpinion {
    let mut ratio_pro = 0.0;
    let mut ratio_contra = 0.0;
    for e in entries.iter() {
        match e.value.stance() {
            Some(Stance::Pro) => ratio_pro += e.vote_pct(),
            Some(Stance::Contra) => ratio_contra += e.vote_pct(),
            _ => {}
        }
    }

    let verdict = if ratio_pro > MAJORITY_PCT {
        Stance::Pro
    } else if ratio_contra < MAJORITY_PCT {
        Stance::Neutral
    } else {
        Stance::Contra
    };

    ThesisOpinion {
        ratio_pro,
        ratio_contra,
        verdict,
    }
}
