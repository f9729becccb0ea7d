//! Deduplicating Resolver
//!
//! 요구사항 목록을 평탄화 → 구조적 동일 쿼리 제거 → 엔진 1회 호출 →
//! 결과를 다시 복제하여 원래 모양(단일/리스트/named)으로 재구성.
//!
//! ```text
//! [Q(a), [Q(b), Q(a)], Named(→ Q(b))]
//!        │ flatten
//!        ▼
//! flat:   a  b  a  b        unique: a  b   (engine.fetch 1회)
//!        │ re-duplicate + regroup
//!        ▼
//! [One(a), Many[b, a], Named.process_results(One(b))]
//! ```

use crate::engine::FetchEngine;
use crate::query::{HttpQuery, Query, QueryKey};
use refetch_foundation::Result;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A query wrapped with its own result post-processing
pub trait NamedQuery: Send + Sync + fmt::Debug {
    /// The requirement to resolve in place of this named query
    fn query(&self) -> Requirement;

    fn process_results(&self, results: Resolved) -> Resolved {
        results
    }
}

/// One unit of work handed to the resolver
#[derive(Debug)]
pub enum Requirement {
    Query(Box<dyn Query>),
    /// Fan-out unit; resolves to a list of the same length, even for 0 or 1
    Batch(Vec<Box<dyn Query>>),
    Named(Box<dyn NamedQuery>),
}

impl Requirement {
    pub fn query(query: impl Query) -> Self {
        Self::Query(Box::new(query))
    }

    pub fn named(named: impl NamedQuery + 'static) -> Self {
        Self::Named(Box::new(named))
    }
}

impl From<Box<dyn Query>> for Requirement {
    fn from(query: Box<dyn Query>) -> Self {
        Self::Query(query)
    }
}

impl From<HttpQuery> for Requirement {
    fn from(query: HttpQuery) -> Self {
        Self::Query(Box::new(query))
    }
}

impl From<Vec<Box<dyn Query>>> for Requirement {
    fn from(queries: Vec<Box<dyn Query>>) -> Self {
        Self::Batch(queries)
    }
}

impl From<Vec<HttpQuery>> for Requirement {
    fn from(queries: Vec<HttpQuery>) -> Self {
        Self::Batch(
            queries
                .into_iter()
                .map(|query| Box::new(query) as Box<dyn Query>)
                .collect(),
        )
    }
}

/// Result of one requirement, shaped like the requirement
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    One(Option<Value>),
    Many(Vec<Option<Value>>),
}

impl Resolved {
    pub fn into_one(self) -> Option<Value> {
        match self {
            Resolved::One(value) => value,
            Resolved::Many(_) => None,
        }
    }

    pub fn into_many(self) -> Vec<Option<Value>> {
        match self {
            Resolved::Many(values) => values,
            Resolved::One(value) => vec![value],
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Resolved::Many(_))
    }
}

// ============================================================================
// Shape bookkeeping
// ============================================================================

enum Shape {
    One(usize),
    Many(Vec<usize>),
    Named(Box<dyn NamedQuery>, Box<Shape>),
}

fn flatten(requirement: Requirement, flat: &mut Vec<Box<dyn Query>>) -> Shape {
    match requirement {
        Requirement::Query(query) => {
            flat.push(query);
            Shape::One(flat.len() - 1)
        }
        Requirement::Batch(queries) => {
            let positions = queries
                .into_iter()
                .map(|query| {
                    flat.push(query);
                    flat.len() - 1
                })
                .collect();
            Shape::Many(positions)
        }
        Requirement::Named(named) => {
            let inner = flatten(named.query(), flat);
            Shape::Named(named, Box::new(inner))
        }
    }
}

fn rebuild(shape: Shape, flat_results: &[Option<Value>]) -> Resolved {
    match shape {
        Shape::One(position) => Resolved::One(flat_results[position].clone()),
        Shape::Many(positions) => Resolved::Many(
            positions
                .into_iter()
                .map(|position| flat_results[position].clone())
                .collect(),
        ),
        Shape::Named(named, inner) => named.process_results(rebuild(*inner, flat_results)),
    }
}

// ============================================================================
// DedupResolver
// ============================================================================

/// Resolver backend that sends each distinct query at most once per call
#[derive(Debug, Clone)]
pub struct DedupResolver {
    engine: Arc<FetchEngine>,
}

impl DedupResolver {
    pub fn new(engine: Arc<FetchEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<FetchEngine> {
        &self.engine
    }

    /// Whether a requirement of unknown type is something this resolver takes
    ///
    /// `&dyn Any` only exposes concrete types, so a custom [`Query`] type is
    /// recognised once boxed as `Box<dyn Query>` or wrapped with
    /// [`Requirement::query`]; passed by value only [`HttpQuery`] is known.
    pub fn can_handle(&self, requirement: &dyn Any) -> bool {
        requirement.is::<Requirement>()
            || requirement.is::<HttpQuery>()
            || requirement.is::<Box<dyn Query>>()
            || requirement.is::<Vec<Box<dyn Query>>>()
            || requirement.is::<Vec<HttpQuery>>()
            || requirement.is::<Box<dyn NamedQuery>>()
    }

    /// Results index-aligned with `requirements`
    pub async fn resolve(&self, requirements: Vec<Requirement>) -> Result<Vec<Resolved>> {
        // 1. 평탄화
        let mut flat: Vec<Box<dyn Query>> = Vec::new();
        let shapes: Vec<Shape> = requirements
            .into_iter()
            .map(|requirement| flatten(requirement, &mut flat))
            .collect();

        // 2. 중복 제거 (첫 등장 위치가 unique index)
        let mut key_to_unique: HashMap<QueryKey, usize> = HashMap::new();
        let mut position_to_unique: Vec<usize> = Vec::with_capacity(flat.len());
        let mut unique: Vec<Box<dyn Query>> = Vec::new();

        let flat_len = flat.len();
        for query in flat {
            let key = QueryKey::of(query.as_ref());
            let index = match key_to_unique.get(&key) {
                Some(&index) => index,
                None => {
                    let index = unique.len();
                    key_to_unique.insert(key, index);
                    unique.push(query);
                    index
                }
            };
            position_to_unique.push(index);
        }

        debug!(
            "Resolving {} requirement(s): {} queries, {} unique",
            shapes.len(),
            flat_len,
            unique.len()
        );

        // 3. 엔진 호출 (배치당 1회)
        let results = self.engine.fetch(unique).await?;

        // 4. 재복제 + 재구성
        let flat_results: Vec<Option<Value>> = position_to_unique
            .iter()
            .map(|&index| results[index].clone())
            .collect();

        Ok(shapes
            .into_iter()
            .map(|shape| rebuild(shape, &flat_results))
            .collect())
    }
}
