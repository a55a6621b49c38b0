//! Closed operation enumerations
//!
//! Each service declares its operations once through [`operations!`]; the
//! enum, its wire tags and its required-field specs all come from that single
//! list. Handlers match on the enum, so an operation without a handler does
//! not compile.

use std::fmt;

use crate::validation::FieldSpec;

pub trait Operation: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every declared operation, in declaration order.
    const ALL: &'static [Self];

    fn tag(self) -> &'static str;

    fn required_fields(self) -> &'static [FieldSpec];

    /// Exact, case-sensitive tag lookup.
    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.tag() == tag)
    }
}

macro_rules! operations {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $tag:literal [$($field:expr),* $(,)?]),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::operation::Operation for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn tag(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }

            fn required_fields(self) -> &'static [$crate::validation::FieldSpec] {
                match self {
                    $(Self::$variant => {
                        const FIELDS: &[$crate::validation::FieldSpec] = &[$($field),*];
                        FIELDS
                    }),+
                }
            }
        }
    };
}

pub(crate) use operations;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    operations! {
        enum Probe {
            Ping => "PING" [],
            Create => "CREATE" [FieldSpec::str("createdBy"), FieldSpec::str("title")],
        }
    }

    #[test]
    fn tags_round_trip_and_are_case_sensitive() {
        for op in Probe::ALL {
            assert_eq!(Probe::from_tag(op.tag()), Some(*op));
        }
        assert_eq!(Probe::from_tag("ping"), None);
        assert_eq!(Probe::from_tag("DROP"), None);
    }

    #[test]
    fn tags_are_unique() {
        let tags: HashSet<&str> = Probe::ALL.iter().map(|op| op.tag()).collect();
        assert_eq!(tags.len(), Probe::ALL.len());
    }

    #[test]
    fn required_fields_follow_declaration() {
        assert!(Probe::Ping.required_fields().is_empty());
        let names: Vec<&str> = Probe::Create.required_fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["createdBy", "title"]);
    }
}
