/// What happened to a watched file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn from_event(kind: &notify::EventKind) -> Option<Self> {
        use notify::EventKind;
        use notify::event::ModifyKind;

        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            // mtime/atime/chmod noise would retrigger rebuilds endlessly
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }

    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}
