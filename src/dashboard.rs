use crate::config::DashboardConfig;
use crate::loader::LoadedRecords;
use crate::notice::Notices;
use crate::section::{SectionKind, SectionView, build_section};
use crate::session::DashboardSession;
use crate::timeline::{TimelineView, project};
use chrono::Datelike;
use serde::Serialize;

/// One section as it appears on the page
#[derive(Clone, Debug, Serialize)]
pub struct SectionPanel {
    pub kind: SectionKind,
    pub slug: &'static str,
    pub title: String,
    pub editable: bool,
    /// Problems local to this section
    pub notices: Notices,
    pub view: Option<SectionView>,
}

/// Bounds of the input widgets
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GridLimits {
    pub factor_min: f64,
    pub factor_max: f64,
    pub factor_step: f64,
    pub year_min: u32,
    pub year_max: u32,
}

/// Everything a single page render needs
#[derive(Clone, Debug, Serialize)]
pub struct DashboardView {
    pub notices: Notices,
    pub sections: Vec<SectionPanel>,
    pub timeline: Option<TimelineView>,
    pub start_year: i32,
    pub grid: GridLimits,
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Recompute the whole dashboard for one session
///
/// Missing tables in `session` are seeded, edited ones are used as they are.
/// Nothing here fails: problems end up as notices on the page or on the
/// section they belong to.
pub fn render_dashboard(
    loaded: &LoadedRecords,
    session: &mut DashboardSession,
    config: &DashboardConfig,
    start_year: i32,
) -> DashboardView {
    let mut notices = Notices::new();
    notices.extend_from(&loaded.notices);

    let sections = config
        .sections
        .iter()
        .map(|section| {
            let mut section_notices = Notices::new();
            let view = build_section(
                &loaded.records,
                session.factors_mut(section.kind),
                section,
                &config.chart,
                &mut section_notices,
            );
            SectionPanel {
                kind: section.kind,
                slug: section.kind.slug(),
                title: section.title.clone(),
                editable: section.editable,
                notices: section_notices,
                view,
            }
        })
        .collect();

    let table = session.timeline_or_seed(
        &loaded.records,
        config.timeline.seed,
        config.timeline.years,
    );
    let timeline = match project(table, &loaded.records, &config.timeline, start_year) {
        Ok(view) => Some(view),
        Err(e) => {
            notices.error(format!("Er is een fout opgetreden: {}", e));
            notices.error("Controleer of het Excel bestand aanwezig is en de juiste structuur heeft.");
            None
        }
    };

    DashboardView {
        notices,
        sections,
        timeline,
        start_year,
        grid: GridLimits {
            factor_min: config.factor_domain.min,
            factor_max: config.factor_domain.max,
            factor_step: config.factor_domain.step,
            year_min: config.timeline.years.min,
            year_max: config.timeline.years.max,
        },
    }
}
