//! Multi-source quality arbitration (`spec.md` §4.4 step 4) — "the
//! numerically delicate part". Kept free of I/O and geometry so it can
//! be unit-tested against hand-built candidate tables.

/// Everything the arbitration rule needs to know about one source's
/// coverage of a footprint.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub density: f64,
    pub quality: i32,
    pub point_count: usize,
    pub acquisition_year: i32,
    pub select_only_for_date: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arbitrated {
    pub chosen_index: usize,
    pub is_mutated: bool,
}

/// Picks a source among `candidates`, or `None` if no source clears
/// `min_density` (`spec.md` §4.4 Error conditions: "no source has
/// density ≥ minimum").
///
/// `main_threshold` and `low_lod_threshold` are the two density
/// thresholds `is_mutated` compares the chosen source against
/// (`max_point_density`/`max_point_density_low_lod` in `spec.md` §6).
pub fn arbitrate(
    candidates: &[Candidate],
    target_date: Option<i32>,
    min_density: f64,
    main_threshold: f64,
    low_lod_threshold: f64,
) -> Option<Arbitrated> {
    let mut eligible: Vec<usize> = (0..candidates.len())
        .filter(|&i| candidates[i].density >= min_density)
        .collect();
    if eligible.is_empty() {
        return None;
    }

    if let Some(date) = target_date {
        let restricted: Vec<usize> = eligible
            .iter()
            .copied()
            .filter(|&i| candidates[i].select_only_for_date && candidates[i].acquisition_year == date)
            .collect();
        if !restricted.is_empty() {
            eligible = restricted;
        }
    }

    let chosen_index = *eligible
        .iter()
        .min_by(|&&a, &&b| {
            let ca = &candidates[a];
            let cb = &candidates[b];
            ca.quality
                .cmp(&cb.quality)
                .then(cb.point_count.cmp(&ca.point_count))
                .then(cb.acquisition_year.cmp(&ca.acquisition_year))
        })
        .expect("eligible is non-empty");

    let chosen = &candidates[chosen_index];
    let is_mutated = chosen.density < low_lod_threshold
        && candidates.iter().enumerate().any(|(i, c)| {
            i != chosen_index
                && c.density >= main_threshold
                && c.acquisition_year != chosen.acquisition_year
        });

    Some(Arbitrated {
        chosen_index,
        is_mutated,
    })
}
