//! Hierarchical addresses for build resources
//!
//! Every supported address normalizes to either a single-record lookup
//! (`BuildAddress`) or a collection query (`BuildsAddress`). Segments are
//! case-sensitive; final id components accept native integers or their
//! string-decimal form.

use crate::error::DataError;

/// A builder reference: an integer id or a unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderRef {
    Id(i64),
    Name(String),
}

impl BuilderRef {
    /// Decimal segments are ids, anything else is a name.
    pub fn parse(segment: &str) -> Self {
        match segment.parse() {
            Ok(id) => BuilderRef::Id(id),
            Err(_) => BuilderRef::Name(segment.to_string()),
        }
    }
}

/// An address resolving to zero or one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildAddress {
    /// `builds/{buildid}`
    Build { buildid: i64 },
    /// `builders/{builderid|name}/builds/{number}`
    BuilderBuild { builder: BuilderRef, number: i64 },
}

impl BuildAddress {
    pub fn parse(segments: &[&str]) -> Result<Self, DataError> {
        match segments {
            ["builds", id] => Ok(BuildAddress::Build {
                buildid: parse_id(id)?,
            }),
            ["builders", builder, "builds", number] => Ok(BuildAddress::BuilderBuild {
                builder: BuilderRef::parse(builder),
                number: parse_id(number)?,
            }),
            _ => Err(DataError::InvalidAddress(segments.join("/"))),
        }
    }
}

/// An address resolving to an ordered (possibly empty) build collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildsAddress {
    /// `builds`
    All,
    /// `builders/{builderid|name}/builds`
    Builder(BuilderRef),
    /// `buildrequests/{id}/builds`
    BuildRequest(i64),
    /// `workers/{id}/builds`
    Worker(i64),
}

impl BuildsAddress {
    pub fn parse(segments: &[&str]) -> Result<Self, DataError> {
        match segments {
            ["builds"] => Ok(BuildsAddress::All),
            ["builders", builder, "builds"] => {
                Ok(BuildsAddress::Builder(BuilderRef::parse(builder)))
            }
            ["buildrequests", id, "builds"] => Ok(BuildsAddress::BuildRequest(parse_id(id)?)),
            ["workers", id, "builds"] => Ok(BuildsAddress::Worker(parse_id(id)?)),
            _ => Err(DataError::InvalidAddress(segments.join("/"))),
        }
    }
}

fn parse_id(segment: &str) -> Result<i64, DataError> {
    segment
        .parse()
        .map_err(|_| DataError::InvalidAddress(format!("not a decimal id: {segment}")))
}
