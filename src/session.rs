use crate::error::EditError;
use crate::factors::{FactorEdit, FactorTable, NumberDomain};
use crate::loader::RecordSet;
use crate::section::{SectionConfig, SectionKind};
use crate::timeline::{TimelineEdit, TimelineTable, YearRange};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

/// Per-visitor state of the dashboard
///
/// Every table starts out empty and is seeded on the first render that has
/// data. After that it is only changed by edits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardSession {
    pub replacement_factors: Option<FactorTable>,
    pub operating_factors: Option<FactorTable>,
    pub timeline: Option<TimelineTable>,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factors(&self, kind: SectionKind) -> Option<&FactorTable> {
        match kind {
            SectionKind::ReplacementInvestments => self.replacement_factors.as_ref(),
            SectionKind::OperatingBudget => self.operating_factors.as_ref(),
        }
    }

    pub fn factors_mut(&mut self, kind: SectionKind) -> &mut Option<FactorTable> {
        match kind {
            SectionKind::ReplacementInvestments => &mut self.replacement_factors,
            SectionKind::OperatingBudget => &mut self.operating_factors,
        }
    }

    /// The timeline table, seeded from `records` if it does not exist yet
    pub fn timeline_or_seed(
        &mut self,
        records: &RecordSet,
        seed: u64,
        years: YearRange,
    ) -> &TimelineTable {
        self.timeline.get_or_insert_with(|| {
            log::debug!("Seeding timeline with seed {}", seed);
            TimelineTable::seeded(records, seed, years)
        })
    }

    /// Apply factor grid edits to one section
    ///
    /// Returns the number of changed cells.
    pub fn edit_factors(
        &mut self,
        section: &SectionConfig,
        edits: &[FactorEdit],
        domain: &NumberDomain,
    ) -> Result<usize, EditError> {
        if !section.editable {
            return Err(EditError::ReadOnly(section.title.clone()));
        }

        let table = self
            .factors_mut(section.kind)
            .as_mut()
            .ok_or(EditError::NotInitialized)?;
        let changed = table.apply_edits(edits, domain)?;

        log::info!("Updated {} factor(s) in '{}'", changed, section.title);
        Ok(changed)
    }

    /// Take over the tables `rendered` seeded that this session still lacks
    ///
    /// Tables already present are kept, so edits made while `rendered` was
    /// out of the store are not lost.
    pub fn adopt_seeded(&mut self, rendered: DashboardSession) {
        if self.replacement_factors.is_none() {
            self.replacement_factors = rendered.replacement_factors;
        }
        if self.operating_factors.is_none() {
            self.operating_factors = rendered.operating_factors;
        }
        if self.timeline.is_none() {
            self.timeline = rendered.timeline;
        }
    }

    pub fn edit_timeline(
        &mut self,
        edits: &[TimelineEdit],
        years: &YearRange,
    ) -> Result<usize, EditError> {
        let table = self.timeline.as_mut().ok_or(EditError::NotInitialized)?;
        let changed = table.apply_edits(edits, years)?;

        log::info!("Updated {} timeline row(s)", changed);
        Ok(changed)
    }
}

/// A stored session and the moment it lapses
#[derive(Clone, Debug)]
struct SessionEntry {
    session: DashboardSession,
    expires_at: SystemTime,
}

/// Sessions by id, dropped after `ttl` without a visit
///
/// The lock is only held to copy a session in or out; rendering happens
/// outside it.
#[derive(Debug)]
pub struct SessionStore {
    entries: Mutex<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// A copy of the live session for `id`, or a fresh one
    ///
    /// Nothing is stored until [`SessionStore::check_in`] is called.
    pub fn check_out(&self, id: &str, now: SystemTime) -> DashboardSession {
        match self.lock().get(id) {
            Some(entry) if entry.expires_at > now => entry.session.clone(),
            _ => DashboardSession::new(),
        }
    }

    /// Store a rendered session and extend its lifetime
    ///
    /// Expired sessions are purged on the way.
    pub fn check_in(&self, id: &str, rendered: DashboardSession, now: SystemTime) {
        let expires_at = now + self.ttl;
        let mut entries = self.lock();

        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        if entries.len() < before {
            log::debug!("Dropped {} expired session(s)", before - entries.len());
        }

        match entries.get_mut(id) {
            Some(entry) => {
                entry.session.adopt_seeded(rendered);
                entry.expires_at = expires_at;
            }
            None => {
                log::debug!("New dashboard session {}", id);
                entries.insert(
                    id.to_string(),
                    SessionEntry {
                        session: rendered,
                        expires_at,
                    },
                );
            }
        }
    }

    /// Run `f` on the live session for `id`
    ///
    /// Returns `None` without creating anything when there is no such
    /// session or it has expired.
    pub fn with_live<T>(
        &self,
        id: &str,
        now: SystemTime,
        f: impl FnOnce(&mut DashboardSession) -> T,
    ) -> Option<T> {
        let mut entries = self.lock();
        let entry = entries.get_mut(id).filter(|e| e.expires_at > now)?;
        entry.expires_at = now + self.ttl;
        Some(f(&mut entry.session))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::TableState;
    use crate::loader::Record;

    fn records() -> RecordSet {
        RecordSet::new(vec![Record::new("Asfalt", 1000.0), Record::new("Bermen", 250.0)])
    }

    fn seeded_session() -> DashboardSession {
        let mut session = DashboardSession::new();
        for config in [
            SectionConfig::replacement_investments(),
            SectionConfig::operating_budget(),
        ] {
            *session.factors_mut(config.kind) = Some(config.seed_factors(&records()));
        }
        session.timeline_or_seed(&records(), 44, YearRange::default());
        session
    }

    #[test]
    fn read_only_section_rejects_edits() {
        let mut session = seeded_session();
        let before = session.clone();

        let err = session
            .edit_factors(
                &SectionConfig::replacement_investments(),
                &[FactorEdit { row: 0, factor: 1.5 }],
                &NumberDomain::default(),
            )
            .unwrap_err();

        assert_eq!(err, EditError::ReadOnly("Vervangingsinvesteringen".into()));
        assert_eq!(session, before);
    }

    #[test]
    fn unseeded_tables_reject_edits() {
        let mut session = DashboardSession::new();

        let err = session
            .edit_factors(
                &SectionConfig::operating_budget(),
                &[FactorEdit { row: 0, factor: 1.5 }],
                &NumberDomain::default(),
            )
            .unwrap_err();
        assert_eq!(err, EditError::NotInitialized);

        let err = session
            .edit_timeline(&[TimelineEdit { row: 0, jaren: 20 }], &YearRange::default())
            .unwrap_err();
        assert_eq!(err, EditError::NotInitialized);
    }

    #[test]
    fn edits_only_touch_their_own_section() {
        let mut session = seeded_session();
        let replacement = session.replacement_factors.clone();

        session
            .edit_factors(
                &SectionConfig::operating_budget(),
                &[FactorEdit { row: 1, factor: 1.75 }],
                &NumberDomain::default(),
            )
            .unwrap();

        let operating = session.factors(SectionKind::OperatingBudget).unwrap();
        assert_eq!(operating.entries()[1].factor, 1.75);
        assert_eq!(operating.state(), TableState::Edited);
        assert_eq!(session.replacement_factors, replacement);
    }

    #[test]
    fn seeding_the_timeline_twice_keeps_edits() {
        let mut session = seeded_session();
        session
            .edit_timeline(&[TimelineEdit { row: 0, jaren: 12 }], &YearRange::default())
            .unwrap();

        let table = session.timeline_or_seed(&records(), 44, YearRange::default());
        assert_eq!(table.entries()[0].jaren, 12);
    }

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn expired_session_starts_fresh() {
        let store = SessionStore::new(TTL);
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        store.check_in("a", seeded_session(), t0);

        assert_eq!(store.check_out("a", t0 + Duration::from_secs(59)), seeded_session());
        assert_eq!(store.check_out("a", t0 + TTL), DashboardSession::new());

        let edit = store.with_live("a", t0 + TTL, |s| {
            s.edit_timeline(&[TimelineEdit { row: 0, jaren: 20 }], &YearRange::default())
        });
        assert!(edit.is_none());
    }

    #[test]
    fn expired_sessions_are_purged_on_check_in() {
        let store = SessionStore::new(TTL);
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        for i in 0..50 {
            store.check_in(&format!("visitor-{}", i), DashboardSession::new(), t0);
        }
        assert_eq!(store.len(), 50);

        store.check_in("late", DashboardSession::new(), t0 + TTL + Duration::from_secs(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn checking_out_does_not_create_sessions() {
        let store = SessionStore::new(TTL);
        let now = SystemTime::UNIX_EPOCH;

        store.check_out("nobody", now);
        assert!(store.with_live("nobody", now, |_| ()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn check_in_keeps_edits_made_during_a_render() {
        let store = SessionStore::new(TTL);
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(5);
        let mut partial = seeded_session();
        partial.timeline = None;
        store.check_in("a", partial, now);

        let rendered = store.check_out("a", now);
        store
            .with_live("a", now, |s| {
                s.edit_factors(
                    &SectionConfig::operating_budget(),
                    &[FactorEdit { row: 0, factor: 0.25 }],
                    &NumberDomain::default(),
                )
            })
            .unwrap()
            .unwrap();

        let mut rendered = rendered;
        rendered.timeline_or_seed(&records(), 44, YearRange::default());
        store.check_in("a", rendered, now);

        let stored = store.check_out("a", now);
        assert_eq!(stored.factors(SectionKind::OperatingBudget).unwrap().entries()[0].factor, 0.25);
        assert!(stored.timeline.is_some());
    }
}
