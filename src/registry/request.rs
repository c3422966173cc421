//! Request parameters for the registry endpoint

use std::fmt;

/// Wildcard search value that matches every registered HOA
pub const SEARCH_ALL: &str = "%";

/// One call to the registry endpoint
///
/// Every mode is a form-encoded POST with an `f` discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    /// `f=l` - full listing
    ListAll,
    /// `f=s, v=<text>` - free-text search by name or registration number
    Search(String),
    /// `f=d, v=<id>` - single entity detail
    Detail(u64),
}

impl LookupRequest {
    pub fn mode(&self) -> &'static str {
        match self {
            Self::ListAll => "l",
            Self::Search(_) => "s",
            Self::Detail(_) => "d",
        }
    }

    /// Form fields in wire order
    pub fn form(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("f", self.mode().to_string())];
        match self {
            Self::ListAll => {}
            Self::Search(text) => fields.push(("v", text.clone())),
            Self::Detail(id) => fields.push(("v", id.to_string())),
        }
        fields
    }
}

impl fmt::Display for LookupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListAll => write!(f, "list-all"),
            Self::Search(text) => write!(f, "search {:?}", text),
            Self::Detail(id) => write!(f, "detail #{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_fields_per_mode() {
        assert_eq!(LookupRequest::ListAll.form(), vec![("f", "l".to_string())]);
        assert_eq!(
            LookupRequest::Search("Smith".into()).form(),
            vec![("f", "s".to_string()), ("v", "Smith".to_string())]
        );
        assert_eq!(
            LookupRequest::Detail(42).form(),
            vec![("f", "d".to_string()), ("v", "42".to_string())]
        );
    }

    #[test]
    fn display_is_readable_in_logs() {
        assert_eq!(LookupRequest::Detail(9).to_string(), "detail #9");
        assert_eq!(LookupRequest::Search("a b".into()).to_string(), "search \"a b\"");
    }
}
