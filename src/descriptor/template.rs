//! Path templates such as `/drives/{uuid}/info`.

use super::error::DescriptorError;

/// One token of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    Literal(String),
    /// `{name}`, filled from positional argument `arg`.
    Placeholder { name: String, arg: usize },
}

/// An ordered sequence of literal and placeholder tokens.
///
/// Placeholders are numbered in declaration order, so `{a}/{b}` takes
/// arguments 0 and 1 unless a descriptor rebinds a name explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathTemplate {
    raw: String,
    tokens: Vec<PathToken>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, DescriptorError> {
        let invalid = |reason: &str| DescriptorError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut next_arg = 0usize;
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        if n == '{' {
                            return Err(invalid("nested '{'"));
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(invalid("unclosed '{'"));
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() {
                        return Err(invalid("empty placeholder name"));
                    }
                    if !literal.is_empty() {
                        tokens.push(PathToken::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(PathToken::Placeholder {
                        name,
                        arg: next_arg,
                    });
                    next_arg += 1;
                }
                '}' => return Err(invalid("unmatched '}'")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            tokens.push(PathToken::Literal(literal));
        }

        Ok(Self {
            raw: template.to_string(),
            tokens,
        })
    }

    /// Point every placeholder called `name` at positional argument `arg`.
    /// Returns false when the template has no such placeholder.
    pub fn rebind(&mut self, name: &str, arg: usize) -> bool {
        let mut found = false;
        for token in &mut self.tokens {
            if let PathToken::Placeholder { name: n, arg: a } = token {
                if n == name {
                    *a = arg;
                    found = true;
                }
            }
        }
        found
    }

    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    pub fn placeholders(&self) -> impl Iterator<Item = (&str, usize)> {
        self.tokens.iter().filter_map(|t| match t {
            PathToken::Placeholder { name, arg } => Some((name.as_str(), *arg)),
            PathToken::Literal(_) => None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placeholders_in_order() {
        let t = PathTemplate::parse("/drives/{uuid}/clone/{zone}").unwrap();
        assert_eq!(
            t.tokens(),
            &[
                PathToken::Literal("/drives/".into()),
                PathToken::Placeholder {
                    name: "uuid".into(),
                    arg: 0
                },
                PathToken::Literal("/clone/".into()),
                PathToken::Placeholder {
                    name: "zone".into(),
                    arg: 1
                },
            ]
        );
    }

    #[test]
    fn test_rebind() {
        let mut t = PathTemplate::parse("/servers/{id}/set").unwrap();
        assert!(t.rebind("id", 3));
        assert!(!t.rebind("missing", 0));
        assert_eq!(t.placeholders().collect::<Vec<_>>(), vec![("id", 3)]);
    }

    #[test]
    fn test_malformed_templates() {
        assert!(PathTemplate::parse("/a/{id").is_err());
        assert!(PathTemplate::parse("/a/{}").is_err());
        assert!(PathTemplate::parse("/a/id}").is_err());
        assert!(PathTemplate::parse("").unwrap().is_empty());
    }
}
