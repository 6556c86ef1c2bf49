//! Static nesting-depth check run on a parsed query before anything executes.
//!
//! Fields of an operation's root selection set are at depth 0 and every nested selection set
//! adds one, so `{ users { posts { id } } }` has depth 2. Fragment spreads and inline fragments
//! are expanded in place and add nothing themselves. A document is accepted if every operation's
//! depth is at most the configured bound.

use std::collections::HashMap;

use async_graphql::parser::{
    self,
    types::{ExecutableDocument, FragmentDefinition, Selection, SelectionSet},
};
use async_graphql::{Name, Pos, Positioned};

use crate::error::ValidationError;

pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLimit {
    max_depth: usize,
    ignore_introspection: bool,
}

impl Default for DepthLimit {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl DepthLimit {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth, ignore_introspection: true }
    }

    /// Whether `__schema`, `__type` and other `__` fields are left out of the count. On by default.
    pub fn ignore_introspection(mut self, ignore: bool) -> Self {
        self.ignore_introspection = ignore;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parses `query` and checks it. Parse failures are reported as validation errors too.
    pub fn validate(&self, query: &str) -> Result<ExecutableDocument, Vec<ValidationError>> {
        let document = parser::parse_query(query).map_err(|err| {
            vec![ValidationError { message: err.to_string(), locations: err.positions().collect() }]
        })?;
        self.check(&document)?;
        Ok(document)
    }

    /// Checks every operation in `document`, returning one error per rejected operation.
    pub fn check(&self, document: &ExecutableDocument) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        for (name, operation) in document.operations.iter() {
            let name = name.map(Name::as_str).unwrap_or("anonymous");
            match self.walker(document).measure(&operation.node.selection_set.node, 0) {
                Ok(depth) if depth > self.max_depth => {
                    tracing::info!(
                        operation = name,
                        max_depth = self.max_depth,
                        "query rejected: too deep"
                    );
                    errors.push(ValidationError::new(
                        format!("'{}' exceeds maximum operation depth of {}", name, self.max_depth),
                        operation.pos,
                    ));
                }
                Ok(_) => {}
                Err(err) => errors.push(err),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The deepest operation in `document`. The count stops once it passes the bound, so the
    /// result is exact up to `max_depth + 1` and only known to be larger beyond that.
    pub fn depth(&self, document: &ExecutableDocument) -> Result<usize, ValidationError> {
        let mut deepest = 0;
        for (_, operation) in document.operations.iter() {
            let depth = self.walker(document).measure(&operation.node.selection_set.node, 0)?;
            deepest = deepest.max(depth);
        }
        Ok(deepest)
    }

    fn walker<'a>(&'a self, document: &'a ExecutableDocument) -> Walker<'a> {
        Walker {
            limit: self,
            fragments: &document.fragments,
            visiting: Vec::new(),
            fragment_depths: HashMap::new(),
        }
    }
}

struct Walker<'a> {
    limit: &'a DepthLimit,
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    /// Fragments currently being expanded, innermost last.
    visiting: Vec<&'a str>,
    /// Depth of each fragment already walked, relative to the selection set it is spread into.
    fragment_depths: HashMap<&'a str, usize>,
}

impl<'a> Walker<'a> {
    /// Depth of the deepest field reachable from `set`, whose own fields sit at `depth`.
    fn measure(&mut self, set: &'a SelectionSet, depth: usize) -> Result<usize, ValidationError> {
        if depth > self.limit.max_depth {
            return Ok(depth);
        }

        let mut deepest = 0;
        for selection in &set.items {
            let reached = match &selection.node {
                Selection::Field(field) => {
                    let field = &field.node;
                    if self.limit.ignore_introspection
                        && field.name.node.as_str().starts_with("__")
                    {
                        continue;
                    }
                    if field.selection_set.node.items.is_empty() {
                        depth
                    } else {
                        depth.max(self.measure(&field.selection_set.node, depth + 1)?)
                    }
                }
                Selection::InlineFragment(fragment) => {
                    self.measure(&fragment.node.selection_set.node, depth)?
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    depth + self.fragment_depth(name, spread.pos)?
                }
            };
            deepest = deepest.max(reached);
        }
        Ok(deepest)
    }

    /// Walks a fragment once and remembers how deep it goes below its spread point.
    fn fragment_depth(&mut self, name: &'a str, pos: Pos) -> Result<usize, ValidationError> {
        if let Some(depth) = self.fragment_depths.get(name) {
            return Ok(*depth);
        }
        if self.visiting.contains(&name) {
            return Err(ValidationError::new(
                format!("cannot spread fragment '{}' within itself", name),
                pos,
            ));
        }
        let fragment = self.fragments.get(name).ok_or_else(|| {
            ValidationError::new(format!("unknown fragment '{}'", name), pos)
        })?;

        self.visiting.push(name);
        let depth = self.measure(&fragment.node.selection_set.node, 0);
        self.visiting.pop();
        let depth = depth?;
        self.fragment_depths.insert(name, depth);
        Ok(depth)
    }
}
