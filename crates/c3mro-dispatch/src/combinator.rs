//! The method combinator: call every directly declared method along an
//! ordering and fold the results.
//!
//! ```
//! use std::sync::Arc;
//!
//! use c3mro_core::{HierarchyBuilder, Linearizer, UnitDecl};
//! use c3mro_dispatch::{reducers, CombinatorConfig, Method, MethodCombinator};
//! use serde_json::json;
//!
//! let mut b = HierarchyBuilder::new();
//! let root = b
//!     .add(UnitDecl::class("Root").method("m", Method::constant(json!(["Root"]))))
//!     .unwrap();
//! b.add(UnitDecl::class("Sub").extends(root).method("m", Method::constant(json!(["Sub"]))))
//!     .unwrap();
//!
//! let linearizer = Arc::new(Linearizer::new(Arc::new(b.build())));
//! let combinator = MethodCombinator::new(linearizer, CombinatorConfig::new(json!([]), reducers::concat));
//! assert_eq!(combinator.execute("Sub", "m", None, &[]).unwrap(), json!(["Sub", "Root"]));
//! ```

use std::fmt;
use std::sync::Arc;

use c3mro_core::{HierarchySource, Linearizer, UnitRef};

use crate::error::CombineError;
use crate::method::{Method, Object, Value};
use crate::resolve::{MethodResolver, MethodSet, MixinMode};
use crate::scope::MixinScope;

/// Folds one method result into the accumulator.
pub type Reducer<A> = Arc<dyn Fn(A, Value) -> A + Send + Sync>;

/// Construction-time configuration of a [`MethodCombinator`].
#[derive(Clone)]
pub struct CombinatorConfig<A> {
    /// Seed of every fold.
    pub initial_value: A,
    pub reducer: Reducer<A>,
    /// Whether mixin-declared methods take part. Requires a scope strategy,
    /// see [`MethodCombinator::with_mixin_scope`].
    pub include_mixin_methods: bool,
}

impl<A> CombinatorConfig<A> {
    /// Configuration that leaves mixin methods out.
    pub fn new<F>(initial_value: A, reducer: F) -> Self
    where
        F: Fn(A, Value) -> A + Send + Sync + 'static,
    {
        CombinatorConfig {
            initial_value,
            reducer: Arc::new(reducer),
            include_mixin_methods: false,
        }
    }

    pub fn include_mixin_methods(mut self, include: bool) -> Self {
        self.include_mixin_methods = include;
        self
    }

    fn mode(&self) -> MixinMode {
        if self.include_mixin_methods {
            MixinMode::Include
        } else {
            MixinMode::Exclude
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for CombinatorConfig<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinatorConfig")
            .field("initial_value", &self.initial_value)
            .field("include_mixin_methods", &self.include_mixin_methods)
            .finish_non_exhaustive()
    }
}

/// Map-reduce across a unit hierarchy.
pub struct MethodCombinator<H: HierarchySource, A> {
    config: CombinatorConfig<A>,
    resolver: MethodResolver<H>,
}

impl<H, A> MethodCombinator<H, A>
where
    H: HierarchySource<Method = Method>,
    A: Clone,
{
    pub fn new(linearizer: Arc<Linearizer<H>>, config: CombinatorConfig<A>) -> Self {
        MethodCombinator {
            resolver: MethodResolver::new(linearizer, config.mode()),
            config,
        }
    }

    /// Attaches the strategy that scopes mixin method lookups.
    pub fn with_mixin_scope(mut self, scope: impl MixinScope + 'static) -> Self {
        self.resolver = self.resolver.with_scope(scope);
        self
    }

    pub fn config(&self) -> &CombinatorConfig<A> {
        &self.config
    }

    pub fn resolver(&self) -> &MethodResolver<H> {
        &self.resolver
    }

    /// The methods `execute` would call for `start` and `method`, in order.
    pub fn method_set(
        &self,
        start: impl Into<UnitRef>,
        method: &str,
    ) -> Result<MethodSet<Method>, CombineError> {
        let unit = self.resolver.linearizer().source().resolve(&start.into())?;
        Ok(self.resolver.method_set(unit, method)?)
    }

    /// Calls every method named `method` that a unit in `start`'s ordering
    /// declares itself, most specific first, folding each result into the
    /// accumulator.
    ///
    /// All bodies share `instance`. The first body error aborts the fold and
    /// is returned as [`CombineError::Method`].
    pub fn execute(
        &self,
        start: impl Into<UnitRef>,
        method: &str,
        instance: Option<&mut Object>,
        args: &[Value],
    ) -> Result<A, CombineError> {
        let methods = self.method_set(start, method)?;

        let mut instance = instance;
        let mut acc = self.config.initial_value.clone();
        for entry in methods.iter() {
            let result = entry
                .body
                .call(instance.as_deref_mut(), args)
                .map_err(CombineError::Method)?;
            acc = (self.config.reducer)(acc, result);
        }
        Ok(acc)
    }

    /// [`execute`](Self::execute) starting from the instance's own unit.
    pub fn invoke(&self, method: &str, instance: &mut Object, args: &[Value]) -> Result<A, CombineError> {
        let unit = instance.unit();
        self.execute(unit, method, Some(instance), args)
    }
}
