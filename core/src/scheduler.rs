use buildtime_build_index::BuildEntry;

/// What to do with an entry offered to a [`PassScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Nothing is running; start a pass for this entry now.
    Start(BuildEntry),
    /// Parked as the next entry; the active pass should be cancelled.
    Queued,
    /// Same entry key as the active pass.
    Ignored,
}

/// Admission rules for processing passes: one active pass, at most one
/// pending entry, newer pending entries replace older ones.
#[derive(Debug, Default)]
pub struct PassScheduler {
    active: Option<String>,
    pending: Option<BuildEntry>,
}

impl PassScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, entry: BuildEntry) -> Admission {
        match &self.active {
            None => {
                self.active = Some(entry.entry_key.clone());
                Admission::Start(entry)
            }
            Some(active) if *active == entry.entry_key => Admission::Ignored,
            Some(_) => {
                self.pending = Some(entry);
                Admission::Queued
            }
        }
    }

    /// Marks the active pass finished and hands out the pending entry, which
    /// becomes the active one.
    pub fn finish(&mut self) -> Option<BuildEntry> {
        self.active = None;
        let next = self.pending.take()?;
        self.active = Some(next.entry_key.clone());
        Some(next)
    }

    pub fn clear_pending(&mut self) -> Option<BuildEntry> {
        self.pending.take()
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn pending(&self) -> Option<&BuildEntry> {
        self.pending.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
