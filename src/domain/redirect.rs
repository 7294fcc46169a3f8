use serde::{Deserialize, Serialize};

/// Pointer from a schedule source to the source that replaces it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redirect {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Redirect as submitted by a caller, before malformed entries are dropped
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RedirectInput {
    pub id: Option<String>,
    pub comment: Option<String>,
}

impl RedirectInput {
    pub fn new(id: impl Into<String>, comment: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            comment,
        }
    }
}

impl std::str::FromStr for RedirectInput {
    type Err = String;

    /// Parses `ID` or `ID:COMMENT`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, comment) = match s.split_once(':') {
            Some((id, comment)) => (id.trim(), Some(comment.trim().to_string())),
            None => (s.trim(), None),
        };
        if id.is_empty() {
            return Err(format!("Redirect is missing an id: {}", s));
        }
        Ok(Self {
            id: Some(id.to_string()),
            comment: comment.filter(|c| !c.is_empty()),
        })
    }
}

impl Redirect {
    /// Keeps the order of `inputs`, dropping entries without a usable id
    pub fn from_inputs(inputs: Vec<RedirectInput>) -> Vec<Redirect> {
        inputs
            .into_iter()
            .filter_map(|input| {
                let id = input.id?.trim().to_string();
                if id.is_empty() || id == "None" {
                    return None;
                }
                Some(Redirect {
                    id,
                    comment: input.comment,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_inputs_drops_entries_without_id() {
        let inputs = vec![
            RedirectInput::new("10", Some("merged".to_string())),
            RedirectInput {
                id: None,
                comment: Some("orphan".to_string()),
            },
            RedirectInput::new("None", None),
            RedirectInput::new("  ", None),
            RedirectInput::new("12", None),
        ];

        let redirects = Redirect::from_inputs(inputs);

        assert_eq!(
            redirects,
            vec![
                Redirect {
                    id: "10".to_string(),
                    comment: Some("merged".to_string()),
                },
                Redirect {
                    id: "12".to_string(),
                    comment: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_redirect_argument() {
        let input: RedirectInput = "42:Replaced by regional feed".parse().unwrap();
        assert_eq!(input.id.as_deref(), Some("42"));
        assert_eq!(input.comment.as_deref(), Some("Replaced by regional feed"));

        let input: RedirectInput = "42".parse().unwrap();
        assert!(input.comment.is_none());

        assert!(":comment only".parse::<RedirectInput>().is_err());
    }
}
