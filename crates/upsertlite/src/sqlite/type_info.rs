use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::StorageClass;

/// The type affinity SQLite assigns to a column from its declared type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    pub fn name(&self) -> &'static str {
        match self {
            Affinity::Integer => "INTEGER",
            Affinity::Text => "TEXT",
            Affinity::Blob => "BLOB",
            Affinity::Real => "REAL",
            Affinity::Numeric => "NUMERIC",
        }
    }

    /// The storage class values usually end up in when stored in a column of this affinity.
    /// `Numeric` columns may hold either kind of number and report `Integer`.
    pub fn preferred_storage(&self) -> StorageClass {
        match self {
            Affinity::Integer | Affinity::Numeric => StorageClass::Integer,
            Affinity::Text => StorageClass::Text,
            Affinity::Blob => StorageClass::Blob,
            Affinity::Real => StorageClass::Real,
        }
    }
}

impl Display for Affinity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// The rules are applied in order, so "CHARINT" has INTEGER affinity.
// <https://www.sqlite.org/datatype3.html#determination_of_column_affinity>
impl FromStr for Affinity {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        Ok(if s.contains("int") {
            Affinity::Integer
        } else if s.contains("char") || s.contains("clob") || s.contains("text") {
            Affinity::Text
        } else if s.contains("blob") || s.trim().is_empty() {
            Affinity::Blob
        } else if s.contains("real") || s.contains("floa") || s.contains("doub") {
            Affinity::Real
        } else {
            Affinity::Numeric
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affinity(decl: &str) -> Affinity {
        match decl.parse() {
            Ok(a) => a,
            Err(never) => match never {},
        }
    }

    #[test]
    fn affinity_rules() {
        assert_eq!(affinity("INT4"), Affinity::Integer);
        assert_eq!(affinity("INTEGER"), Affinity::Integer);
        assert_eq!(affinity("UNSIGNED BIG INT"), Affinity::Integer);
        assert_eq!(affinity("CHARINT"), Affinity::Integer);

        assert_eq!(affinity("CHARACTER(20)"), Affinity::Text);
        assert_eq!(affinity("NVARCHAR(100)"), Affinity::Text);
        assert_eq!(affinity("CLOB"), Affinity::Text);

        assert_eq!(affinity("BLOB"), Affinity::Blob);
        assert_eq!(affinity(""), Affinity::Blob);

        assert_eq!(affinity("REAL"), Affinity::Real);
        assert_eq!(affinity("DOUBLE PRECISION"), Affinity::Real);

        assert_eq!(affinity("NUMERIC"), Affinity::Numeric);
        assert_eq!(affinity("DECIMAL(10,5)"), Affinity::Numeric);
        assert_eq!(affinity("BOOLEAN"), Affinity::Numeric);
        assert_eq!(affinity("DATETIME"), Affinity::Numeric);
    }

    #[test]
    fn preferred_storage() {
        assert_eq!(Affinity::Real.preferred_storage(), StorageClass::Real);
        assert_eq!(affinity("TEXT").preferred_storage(), StorageClass::Text);
    }
}
