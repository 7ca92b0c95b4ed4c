use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::models::{AudioFeature, Field, TrackRecord};

pub const DEFAULT_MAX_SAMPLE: usize = 100;
pub const DEFAULT_SEED: u64 = 42;

/// Candidates per strategy are drawn at twice the budget to leave room for de-duplication
const OVERSAMPLE_FACTOR: usize = 2;
/// Records taken from each end of every primary feature
const EXTREMES_PER_FEATURE: usize = 3;

/// How `max_size` is divided between the three selection strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyBudgets {
    pub popularity: usize,
    pub diversity: usize,
    pub random: usize,
}

impl StrategyBudgets {
    /// 40% popularity, 40% diversity, remainder random
    pub fn for_size(max_size: usize) -> Self {
        let popularity = max_size * 2 / 5;
        let diversity = max_size * 2 / 5;
        Self {
            popularity,
            diversity,
            random: max_size - popularity - diversity,
        }
    }
}

/// Result of one sampling pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub positions: Vec<usize>,
    pub backfilled: usize,
}

/// Deterministic multi-strategy sampler. Every call owns its generator, so
/// concurrent calls never perturb each other.
pub struct StrategicSampler {
    max_size: usize,
    seed: u64,
}

impl Default for StrategicSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLE, DEFAULT_SEED)
    }
}

impl StrategicSampler {
    pub fn new(max_size: usize, seed: u64) -> Self {
        Self { max_size, seed }
    }

    /// Select records, returning clones in selection order
    pub fn sample(&self, tracks: &[TrackRecord]) -> Vec<TrackRecord> {
        self.sample_indices(tracks)
            .into_iter()
            .map(|index| tracks[index].clone())
            .collect()
    }

    /// Select positions into `tracks`. Output order is popularity picks,
    /// then diversity picks, then random picks, then backfill.
    pub fn sample_indices(&self, tracks: &[TrackRecord]) -> Vec<usize> {
        self.select(tracks).positions
    }

    /// Selected positions plus how many of the trailing ones came from backfill
    pub fn select(&self, tracks: &[TrackRecord]) -> Selection {
        if tracks.len() <= self.max_size {
            return Selection {
                positions: (0..tracks.len()).collect(),
                backfilled: 0,
            };
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let budgets = StrategyBudgets::for_size(self.max_size);

        let popular = Self::popular_indices(tracks, budgets.popularity * OVERSAMPLE_FACTOR);
        let diverse = Self::diverse_indices(tracks, budgets.diversity * OVERSAMPLE_FACTOR, &mut rng);
        let random_count = (budgets.random * OVERSAMPLE_FACTOR).min(tracks.len());
        let random = draw_from(&(0..tracks.len()).collect::<Vec<_>>(), random_count, &mut rng);

        debug!(
            popular = popular.len(),
            diverse = diverse.len(),
            random = random.len(),
            "collected sampling candidates"
        );

        let mut positions = merge_candidates(vec![popular, diverse, random], self.max_size);
        let backfilled = backfill(&mut positions, tracks.len(), self.max_size, &mut rng);
        Selection {
            positions,
            backfilled,
        }
    }

    /// Highest-popularity records first; original order when no record has a popularity
    fn popular_indices(tracks: &[TrackRecord], count: usize) -> Vec<usize> {
        if !column_present(tracks, Field::Popularity) {
            return (0..tracks.len().min(count)).collect();
        }
        let mut ranked = ranked_by(tracks, Field::Popularity, Ordering::Greater);
        ranked.truncate(count);
        ranked
    }

    /// Feature extremes, padded with random records up to `count`
    fn diverse_indices(tracks: &[TrackRecord], count: usize, rng: &mut StdRng) -> Vec<usize> {
        if count == 0 {
            return Vec::new();
        }

        let features: Vec<AudioFeature> = AudioFeature::PRIMARY
            .into_iter()
            .filter(|feature| column_present(tracks, feature.field()))
            .collect();

        if features.is_empty() {
            let all: Vec<usize> = (0..tracks.len()).collect();
            return draw_from(&all, count.min(tracks.len()), rng);
        }

        let mut extremes = BTreeSet::new();
        for feature in features {
            let highest = ranked_by(tracks, feature.field(), Ordering::Greater);
            let lowest = ranked_by(tracks, feature.field(), Ordering::Less);
            extremes.extend(highest.into_iter().take(EXTREMES_PER_FEATURE));
            extremes.extend(lowest.into_iter().take(EXTREMES_PER_FEATURE));
        }

        let mut diverse: Vec<usize> = extremes.iter().copied().collect();
        if diverse.len() < count {
            let remaining: Vec<usize> = (0..tracks.len()).filter(|i| !extremes.contains(i)).collect();
            let needed = (count - diverse.len()).min(remaining.len());
            diverse.extend(draw_from(&remaining, needed, rng));
        }
        diverse.truncate(count);
        diverse
    }
}

/// Convenience entry point with explicit size and seed
pub fn create_sample(tracks: &[TrackRecord], max_size: usize, seed: u64) -> Vec<TrackRecord> {
    StrategicSampler::new(max_size, seed).sample(tracks)
}

/// Concatenate strategy outputs in order, keep the first occurrence of each
/// position and stop at `max_size`
fn merge_candidates(strategies: Vec<Vec<usize>>, max_size: usize) -> Vec<usize> {
    let mut seen = HashSet::new();
    strategies
        .into_iter()
        .flatten()
        .filter(|index| seen.insert(*index))
        .take(max_size)
        .collect()
}

/// Append random unselected positions until `max_size` or the collection is
/// exhausted. Returns the number appended.
fn backfill(selected: &mut Vec<usize>, total: usize, max_size: usize, rng: &mut StdRng) -> usize {
    if selected.len() >= max_size {
        return 0;
    }
    let chosen: HashSet<usize> = selected.iter().copied().collect();
    let remaining: Vec<usize> = (0..total).filter(|i| !chosen.contains(i)).collect();
    let needed = (max_size - selected.len()).min(remaining.len());
    debug!(needed, "backfilling sample with random tracks");
    selected.extend(draw_from(&remaining, needed, rng));
    needed
}

/// A column counts as present when at least one record carries the field
fn column_present(tracks: &[TrackRecord], field: Field) -> bool {
    tracks.iter().any(|track| track.has(field))
}

/// Positions of records with a valid value for `field`, sorted so that
/// `direction` (Greater = descending) comes first. Ties keep original order.
fn ranked_by(tracks: &[TrackRecord], field: Field, direction: Ordering) -> Vec<usize> {
    let mut valued: Vec<(usize, f64)> = tracks
        .iter()
        .enumerate()
        .filter_map(|(index, track)| track.number(field).map(|value| (index, value)))
        .collect();

    valued.sort_by(|a, b| {
        let ascending = a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal);
        if direction == Ordering::Greater {
            ascending.reverse()
        } else {
            ascending
        }
    });
    valued.into_iter().map(|(index, _)| index).collect()
}

/// Uniform draw without replacement
fn draw_from(pool: &[usize], count: usize, rng: &mut StdRng) -> Vec<usize> {
    pool.choose_multiple(rng, count).copied().collect()
}
