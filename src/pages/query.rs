// src/pages/query.rs
// =============================================================================
// Page selectors.
//
// A selector is a comma separated list of terms:
//   status!=trash, template=basic|news, parent=1, start=0, limit=500
//
// Field terms (id, template, status, parent) use `=` or `!=` and may list
// alternatives with `|`. `start` and `limit` define the window of matching
// pages the crawl covers.
// =============================================================================

use std::str::FromStr;

use super::Page;
use crate::error::CrawlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Template,
    Status,
    Parent,
}

impl Field {
    fn value_of(self, page: &Page) -> String {
        match self {
            Field::Id => page.id.to_string(),
            Field::Template => page.template.clone(),
            Field::Status => page.status.clone(),
            Field::Parent => page.parent.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Condition {
    field: Field,
    negated: bool,
    values: Vec<String>,
}

impl Condition {
    fn matches(&self, page: &Page) -> bool {
        let actual = self.field.value_of(page);
        self.values.iter().any(|v| *v == actual) != self.negated
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    source: String,
    conditions: Vec<Condition>,
    /// First matching page to crawl
    pub start: Option<usize>,
    /// Maximum number of matching pages to crawl
    pub limit: Option<usize>,
}

impl PageQuery {
    /// Selector string this query was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, page: &Page) -> bool {
        self.conditions.iter().all(|c| c.matches(page))
    }
}

impl FromStr for PageQuery {
    type Err = CrawlError;

    fn from_str(selector: &str) -> Result<Self, Self::Err> {
        let mut query = PageQuery {
            source: selector.trim().to_string(),
            ..Default::default()
        };

        for term in selector.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let bad_term = || CrawlError::Selector(term.to_string());

            let (key, negated, value) = match term.split_once("!=") {
                Some((key, value)) => (key, true, value),
                None => {
                    let (key, value) = term.split_once('=').ok_or_else(bad_term)?;
                    (key, false, value)
                }
            };
            let key = key.trim();
            let value = value.trim();

            let field = match key {
                "start" | "limit" => {
                    let n: usize = value.parse().map_err(|_| bad_term())?;
                    if negated {
                        return Err(bad_term());
                    }
                    if key == "start" {
                        query.start = Some(n);
                    } else {
                        query.limit = Some(n);
                    }
                    continue;
                }
                "id" => Field::Id,
                "template" => Field::Template,
                "status" => Field::Status,
                "parent" => Field::Parent,
                _ => return Err(bad_term()),
            };

            query.conditions.push(Condition {
                field,
                negated,
                values: value.split('|').map(|v| v.trim().to_string()).collect(),
            });
        }

        Ok(query)
    }
}
