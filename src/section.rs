use crate::chart::{ChartOptions, bar_chart_svg, pie_chart_svg};
use crate::error::SectionError;
use crate::factors::{FactorRange, FactorTable, TableState};
use crate::format::{format_euro, format_factor, round_to};
use crate::loader::RecordSet;
use crate::notice::Notices;
use serde::{Deserialize, Serialize};

/// The dashboard sections that carry a factor table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    /// "Vervangingsinvesteringen"
    ReplacementInvestments,
    /// "Exploitatiebudget"
    OperatingBudget,
}

impl SectionKind {
    pub const ALL: [SectionKind; 2] = [
        SectionKind::ReplacementInvestments,
        SectionKind::OperatingBudget,
    ];

    /// Path segment used by the web routes
    pub fn slug(&self) -> &'static str {
        match self {
            SectionKind::ReplacementInvestments => "replacement-investments",
            SectionKind::OperatingBudget => "operating-budget",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

/// How one section seeds and exposes its factors
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionConfig {
    pub kind: SectionKind,
    pub title: String,
    pub seed: u64,
    pub factor_range: FactorRange,
    /// Whether the factor grid is shown for editing
    pub editable: bool,
}

impl SectionConfig {
    pub fn replacement_investments() -> Self {
        Self {
            kind: SectionKind::ReplacementInvestments,
            title: "Vervangingsinvesteringen".to_string(),
            seed: 42,
            factor_range: FactorRange::new(0.8, 1.2),
            editable: false,
        }
    }

    pub fn operating_budget() -> Self {
        Self {
            kind: SectionKind::OperatingBudget,
            title: "Exploitatiebudget".to_string(),
            seed: 43,
            factor_range: FactorRange::new(0.9, 1.3),
            editable: true,
        }
    }

    /// Seed a fresh factor table for `records`
    pub fn seed_factors(&self, records: &RecordSet) -> FactorTable {
        log::debug!("Seeding factors for '{}' with seed {}", self.title, self.seed);
        FactorTable::seeded(records, self.seed, self.factor_range)
    }
}

/// A record joined with its factor
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionRow {
    pub object: String,
    pub waarde: f64,
    /// `None` when the factor table has no entry for the object
    pub factor: Option<f64>,
    pub resultaat: Option<f64>,
}

/// A row of the read-only data table, formatted for display
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayRow {
    pub object: String,
    pub oorspronkelijke_waarde: String,
    pub factor: Option<f64>,
    pub resultaat: String,
}

/// Share of one object in the section total
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Slice {
    pub object: String,
    pub waarde: f64,
    pub share: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Totals {
    pub original: f64,
    pub adjusted: f64,
    /// `adjusted - original`
    pub delta: f64,
    pub original_display: String,
    pub adjusted_display: String,
    pub delta_display: String,
}

/// A row of the editable factor grid
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FactorGridRow {
    pub row: usize,
    pub object: String,
    pub factor: f64,
    pub display: String,
}

/// Everything one section shows
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionView {
    pub kind: SectionKind,
    pub slug: &'static str,
    pub title: String,
    pub rows: Vec<SectionRow>,
    pub display_rows: Vec<DisplayRow>,
    pub distribution: Vec<Slice>,
    pub totals: Totals,
    /// Present only for editable sections
    pub factor_grid: Option<Vec<FactorGridRow>>,
    pub factor_state: TableState,
    pub bar_chart_svg: String,
    pub pie_chart_svg: String,
}

/// Join records with factors and compute `resultaat = waarde * factor`
pub fn apply_factors(records: &RecordSet, factors: &FactorTable) -> Vec<SectionRow> {
    let lookup = factors.lookup();

    records
        .iter()
        .map(|record| {
            let factor = lookup.get(record.object.as_str()).copied();
            SectionRow {
                object: record.object.clone(),
                waarde: record.waarde,
                factor,
                resultaat: factor.map(|f| record.waarde * f),
            }
        })
        .collect()
}

/// Original total, adjusted total and their difference
///
/// Rows without a factor count towards the original total only.
pub fn totals(rows: &[SectionRow]) -> Totals {
    let original: f64 = rows.iter().map(|r| r.waarde).sum();
    let adjusted: f64 = rows.iter().filter_map(|r| r.resultaat).sum();
    let delta = adjusted - original;

    Totals {
        original,
        adjusted,
        delta,
        original_display: format_euro(original),
        adjusted_display: format_euro(adjusted),
        delta_display: format_euro(delta),
    }
}

/// Share of each row in the original total
pub fn distribution(rows: &[SectionRow]) -> Vec<Slice> {
    let total: f64 = rows.iter().map(|r| r.waarde).sum();

    rows.iter()
        .map(|r| Slice {
            object: r.object.clone(),
            waarde: r.waarde,
            share: if total > 0.0 { r.waarde / total } else { 0.0 },
        })
        .collect()
}

/// Build one dashboard section
///
/// Seeds the section's factor table into `factors` on first use; an existing
/// table, edited or not, is used as it is.
///
/// # Errors
/// * `NoData` when there are no records
/// * `Chart` when a chart cannot be drawn
pub fn try_build_section(
    records: &RecordSet,
    factors: &mut Option<FactorTable>,
    config: &SectionConfig,
    chart: &ChartOptions,
) -> Result<SectionView, SectionError> {
    if records.is_empty() {
        return Err(SectionError::NoData);
    }

    let table = factors.get_or_insert_with(|| config.seed_factors(records));
    let rows = apply_factors(records, table);

    let display_rows = rows
        .iter()
        .map(|r| DisplayRow {
            object: r.object.clone(),
            oorspronkelijke_waarde: format_euro(r.waarde),
            factor: r.factor.map(|f| round_to(f, 3)),
            resultaat: format_euro(r.resultaat.unwrap_or(f64::NAN)),
        })
        .collect();

    let factor_grid = config.editable.then(|| {
        table
            .entries()
            .iter()
            .enumerate()
            .map(|(row, e)| FactorGridRow {
                row,
                object: e.object.clone(),
                factor: round_to(e.factor, 2),
                display: format_factor(e.factor),
            })
            .collect()
    });

    let distribution = distribution(&rows);
    let bar_chart_svg = bar_chart_svg(&distribution, &chart.titled("Verdeling per Object"))
        .map_err(|e| SectionError::Chart(e.to_string()))?;
    let pie_chart_svg = pie_chart_svg(&distribution, &chart.titled("Verdeling per Object"))
        .map_err(|e| SectionError::Chart(e.to_string()))?;

    Ok(SectionView {
        kind: config.kind,
        slug: config.kind.slug(),
        title: config.title.clone(),
        totals: totals(&rows),
        rows,
        display_rows,
        distribution,
        factor_grid,
        factor_state: table.state(),
        bar_chart_svg,
        pie_chart_svg,
    })
}

/// Build one dashboard section, reporting failures instead of returning them
///
/// A failing section is reported through `notices` and renders nothing;
/// the rest of the page is unaffected.
pub fn build_section(
    records: &RecordSet,
    factors: &mut Option<FactorTable>,
    config: &SectionConfig,
    chart: &ChartOptions,
    notices: &mut Notices,
) -> Option<SectionView> {
    match try_build_section(records, factors, config, chart) {
        Ok(view) => Some(view),
        Err(SectionError::NoData) => {
            notices.error(SectionError::NoData.to_string());
            None
        }
        Err(e) => {
            notices.error(format!("Error in section '{}': {}", config.title, e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{FactorEdit, NumberDomain};
    use crate::loader::Record;

    fn records() -> RecordSet {
        RecordSet::new(vec![
            Record::new("Asfalt", 1000.0),
            Record::new("Bermen", 250.5),
            Record::new("Kolken", 80.0),
        ])
    }

    #[test]
    fn resultaat_is_waarde_times_factor() {
        let mut factors = None;
        let view = try_build_section(
            &records(),
            &mut factors,
            &SectionConfig::replacement_investments(),
            &ChartOptions::default(),
        )
        .unwrap();

        let table = factors.as_ref().unwrap();
        for (row, entry) in view.rows.iter().zip(table.entries()) {
            assert_eq!(row.factor, Some(entry.factor));
            assert_eq!(row.resultaat, Some(row.waarde * entry.factor));
        }

        let adjusted: f64 = view.rows.iter().filter_map(|r| r.resultaat).sum();
        assert_eq!(view.totals.original, 1330.5);
        assert_eq!(view.totals.delta, adjusted - view.totals.original);
        assert_eq!(view.totals.original_display, "€ 1.330,50");
    }

    #[test]
    fn seeded_factors_are_reused_across_renders() {
        let config = SectionConfig::replacement_investments();
        let mut factors = None;

        let first = try_build_section(&records(), &mut factors, &config, &ChartOptions::default()).unwrap();
        let second = try_build_section(&records(), &mut factors, &config, &ChartOptions::default()).unwrap();
        assert_eq!(first.rows, second.rows);

        let mut fresh = None;
        let other_session =
            try_build_section(&records(), &mut fresh, &config, &ChartOptions::default()).unwrap();
        assert_eq!(first.rows, other_session.rows);
    }

    #[test]
    fn edited_factors_drive_the_next_render() {
        let config = SectionConfig::operating_budget();
        let mut factors = None;
        try_build_section(&records(), &mut factors, &config, &ChartOptions::default()).unwrap();

        factors
            .as_mut()
            .unwrap()
            .apply_edits(&[FactorEdit { row: 1, factor: 2.0 }], &NumberDomain::default())
            .unwrap();

        let view = try_build_section(&records(), &mut factors, &config, &ChartOptions::default()).unwrap();
        assert_eq!(view.rows[1].factor, Some(2.0));
        assert_eq!(view.rows[1].resultaat, Some(501.0));
        assert_eq!(view.factor_state, TableState::Edited);
    }

    #[test]
    fn only_editable_sections_expose_the_grid() {
        let mut a = None;
        let mut b = None;
        let read_only = try_build_section(
            &records(),
            &mut a,
            &SectionConfig::replacement_investments(),
            &ChartOptions::default(),
        )
        .unwrap();
        let editable = try_build_section(
            &records(),
            &mut b,
            &SectionConfig::operating_budget(),
            &ChartOptions::default(),
        )
        .unwrap();

        assert!(read_only.factor_grid.is_none());
        let grid = editable.factor_grid.unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[2].row, 2);
        assert_eq!(grid[2].object, "Kolken");
    }

    #[test]
    fn empty_records_render_nothing() {
        let mut factors = None;
        let mut notices = Notices::new();

        let view = build_section(
            &RecordSet::default(),
            &mut factors,
            &SectionConfig::operating_budget(),
            &ChartOptions::default(),
            &mut notices,
        );

        assert!(view.is_none());
        assert!(factors.is_none());
        assert_eq!(notices.messages(), vec!["No data available"]);
    }

    #[test]
    fn objects_without_a_factor_are_left_out_of_the_adjusted_total() {
        let table = FactorTable::seeded(
            &RecordSet::new(vec![Record::new("Asfalt", 1.0)]),
            42,
            FactorRange::new(1.0, 1.0),
        );
        let rows = apply_factors(&records(), &table);

        assert_eq!(rows[0].resultaat, Some(1000.0));
        assert_eq!(rows[1].factor, None);
        assert_eq!(totals(&rows).adjusted, 1000.0);
        assert_eq!(totals(&rows).delta, 1000.0 - 1330.5);
    }

    #[test]
    fn shares_sum_to_one() {
        let table = FactorTable::seeded(&records(), 42, FactorRange::new(0.8, 1.2));
        let slices = distribution(&apply_factors(&records(), &table));
        let sum: f64 = slices.iter().map(|s| s.share).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn slugs_round_trip() {
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(SectionKind::from_slug("nope"), None);
    }
}
