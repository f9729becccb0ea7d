//! Before-query hooks
//!
//! 쿼리가 캐시 조회 직전에 수정될 기회 (환경 설정, 공통 config 주입 등).
//! 대상 선택은 타입(`TypeId`) 또는 명시적 predicate.

use crate::query::Query;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&dyn Query) -> bool + Send + Sync>;
type Action = Arc<dyn Fn(&mut dyn Query) + Send + Sync>;

enum Target {
    Type { id: TypeId, name: &'static str },
    Any,
    Matching(Predicate),
}

struct Hook {
    target: Target,
    action: Action,
}

/// Ordered list of hooks; all matching hooks run, in registration order
#[derive(Default, Clone)]
pub struct BeforeQueryHooks {
    hooks: Vec<Arc<Hook>>,
}

impl BeforeQueryHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on every query of concrete type `Q`
    pub fn for_type<Q, F>(&mut self, f: F)
    where
        Q: Query,
        F: Fn(&mut Q) + Send + Sync + 'static,
    {
        let action: Action = Arc::new(move |query: &mut dyn Query| {
            if let Some(typed) = query.as_any_mut().downcast_mut::<Q>() {
                f(typed);
            }
        });
        self.hooks.push(Arc::new(Hook {
            target: Target::Type {
                id: TypeId::of::<Q>(),
                name: type_name::<Q>(),
            },
            action,
        }));
    }

    pub fn for_any<F>(&mut self, f: F)
    where
        F: Fn(&mut dyn Query) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(Hook {
            target: Target::Any,
            action: Arc::new(f),
        }));
    }

    pub fn for_matching<P, F>(&mut self, predicate: P, f: F)
    where
        P: Fn(&dyn Query) -> bool + Send + Sync + 'static,
        F: Fn(&mut dyn Query) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(Hook {
            target: Target::Matching(Arc::new(predicate)),
            action: Arc::new(f),
        }));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Apply all matching hooks to one query
    pub fn apply(&self, query: &mut dyn Query) {
        for hook in &self.hooks {
            let matches = match &hook.target {
                Target::Type { id, .. } => query.as_any().type_id() == *id,
                Target::Any => true,
                Target::Matching(predicate) => predicate(&*query),
            };
            if matches {
                (hook.action)(query);
            }
        }
    }
}

impl fmt::Debug for BeforeQueryHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<&str> = self
            .hooks
            .iter()
            .map(|hook| match &hook.target {
                Target::Type { name, .. } => *name,
                Target::Any => "any",
                Target::Matching(_) => "predicate",
            })
            .collect();
        f.debug_struct("BeforeQueryHooks")
            .field("targets", &targets)
            .finish()
    }
}
