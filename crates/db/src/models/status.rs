//! Status enums mapping to SMALLINT lookup tables, with explicit
//! transition tables.
//!
//! Each enum variant's discriminant matches the seed data order
//! (1-based) in the corresponding `*_statuses` database table. Status
//! is never assigned freely: a transition is legal only if the
//! `can_transition_to` table admits the edge, and every repository
//! UPDATE repeats the same guard in its WHERE clause so an illegal edge
//! is a no-op at the database level too.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Lowercase label as seeded in the lookup table.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            /// Look up a variant from its database ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Project processing lifecycle status.
    ProjectStatus {
        Pending = 1 => "pending",
        Processing = 2 => "processing",
        Completed = 3 => "completed",
        Failed = 4 => "failed",
        Cancelled = 5 => "cancelled",
    }
}

impl ProjectStatus {
    /// The explicit transition table. Any edge not listed here is
    /// illegal and must leave the record unchanged.
    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
        )
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Cancellation is allowed only before the record is terminal.
    pub fn can_cancel(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

define_status_enum! {
    /// Per-layer processing status, advanced only forward.
    LayerStatus {
        Pending = 1 => "pending",
        Processing = 2 => "processing",
        Completed = 3 => "completed",
        Failed = 4 => "failed",
    }
}

impl LayerStatus {
    /// Legal forward edges for a layer.
    pub fn can_transition_to(self, next: LayerStatus) -> bool {
        use LayerStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Failed) | (Processing, Completed) | (Processing, Failed)
        )
    }
}

define_status_enum! {
    /// Processing log entry status.
    LogStatus {
        Started = 1 => "started",
        InProgress = 2 => "in_progress",
        Completed = 3 => "completed",
        Failed = 4 => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_status_ids_match_seed_data() {
        assert_eq!(ProjectStatus::Pending.id(), 1);
        assert_eq!(ProjectStatus::Processing.id(), 2);
        assert_eq!(ProjectStatus::Completed.id(), 3);
        assert_eq!(ProjectStatus::Failed.id(), 4);
        assert_eq!(ProjectStatus::Cancelled.id(), 5);
    }

    #[test]
    fn project_status_round_trips_through_id() {
        for status in [
            ProjectStatus::Pending,
            ProjectStatus::Processing,
            ProjectStatus::Completed,
            ProjectStatus::Failed,
            ProjectStatus::Cancelled,
        ] {
            assert_eq!(ProjectStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(ProjectStatus::from_id(0), None);
        assert_eq!(ProjectStatus::from_id(99), None);
    }

    #[test]
    fn transition_table_admits_only_listed_edges() {
        use ProjectStatus::*;
        let all = [Pending, Processing, Completed, Failed, Cancelled];
        let legal = [
            (Pending, Processing),
            (Pending, Cancelled),
            (Processing, Completed),
            (Processing, Failed),
            (Processing, Cancelled),
        ];

        for from in all {
            for to in all {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "edge {from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        use ProjectStatus::*;
        for terminal in [Completed, Failed, Cancelled] {
            assert!(terminal.is_terminal());
            for to in [Pending, Processing, Completed, Failed, Cancelled] {
                assert!(!terminal.can_transition_to(to));
            }
        }
    }

    #[test]
    fn can_cancel_only_before_terminal() {
        assert!(ProjectStatus::Pending.can_cancel());
        assert!(ProjectStatus::Processing.can_cancel());
        assert!(!ProjectStatus::Completed.can_cancel());
        assert!(!ProjectStatus::Failed.can_cancel());
        assert!(!ProjectStatus::Cancelled.can_cancel());
    }

    #[test]
    fn layer_status_moves_only_forward() {
        use LayerStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Failed));
        // No backward or self edges.
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Pending));
    }

    #[test]
    fn status_labels() {
        assert_eq!(ProjectStatus::Processing.as_str(), "processing");
        assert_eq!(LayerStatus::Completed.as_str(), "completed");
        assert_eq!(LogStatus::InProgress.as_str(), "in_progress");
    }
}
