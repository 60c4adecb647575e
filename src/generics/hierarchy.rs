use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::generics::{BindingSuperContainer, BoundSuperCollector, GenericTypeBinder, Route};
use crate::signature::{GenericRefType, JavaType, RefType};
use crate::types::ClassFile;

/// Index of a class inside a [`ClassHierarchy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

/// A fixed set of decoded classes, addressed by [`ClassId`] or internal name.
///
/// Supertypes that are not part of the set are treated as external: they are
/// recorded but never walked.
#[derive(Debug)]
pub struct ClassHierarchy {
    classes: Vec<Arc<ClassFile>>,
    by_name: HashMap<String, ClassId>,
    bound_supers: Vec<OnceLock<BindingSuperContainer>>,
}

impl ClassHierarchy {
    /// Build a hierarchy from `classes` and every class nested in them.
    ///
    /// When two classes share a name the first one wins.
    pub fn new(classes: impl IntoIterator<Item = Arc<ClassFile>>) -> Self {
        let mut hierarchy = Self {
            classes: Vec::new(),
            by_name: HashMap::new(),
            bound_supers: Vec::new(),
        };
        for class in classes {
            hierarchy.register(class);
        }
        hierarchy
    }

    fn register(&mut self, class: Arc<ClassFile>) {
        let name = class.class_type().internal_name().to_string();
        if self.by_name.contains_key(&name) {
            debug!(class = %name, "duplicate class ignored");
            return;
        }
        let id = ClassId(self.classes.len());
        self.by_name.insert(name, id);
        self.classes.push(Arc::clone(&class));
        self.bound_supers.push(OnceLock::new());
        for nested in class.inner_classes() {
            self.register(Arc::clone(&nested.class));
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn id_of(&self, ty: &RefType) -> Option<ClassId> {
        self.id(ty.internal_name())
    }

    /// The class behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different hierarchy; use [`Self::get`]
    /// when that is possible.
    pub fn class(&self, id: ClassId) -> &Arc<ClassFile> {
        &self.classes[id.0]
    }

    pub fn get(&self, id: ClassId) -> Option<&Arc<ClassFile>> {
        self.classes.get(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId)
    }

    /// Every ancestor of `id` bound against its own type variables, starting
    /// with the class itself.
    ///
    /// Computed on first request and shared afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different hierarchy.
    pub fn binding_supers(&self, id: ClassId) -> &BindingSuperContainer {
        self.bound_supers[id.0].get_or_init(|| {
            let class = self.class(id);
            let mut collector = BoundSuperCollector::new();
            let this_type = class.this_general_type();
            let binder = match &this_type {
                JavaType::Generic(g) => Some(GenericTypeBinder::build_identity_bindings(g)),
                _ => None,
            };
            collector.collect(this_type, Route::Identity);
            let mut active = vec![id];
            self.walk_supers(id, binder.as_ref(), &mut collector, Route::Extension, &mut active);
            collector.into_container(class.class_type().clone())
        })
    }

    /// Record the ancestors of `id` as seen from the instantiation `bound`,
    /// e.g. the supertypes of `Fred<String>` rather than of `Fred<X>`.
    ///
    /// The super class edge is tagged with `route`; interface edges are always
    /// [`Route::Interface`].
    pub fn collect_bound_supers(
        &self,
        id: ClassId,
        bound: &JavaType,
        collector: &mut BoundSuperCollector,
        route: Route,
    ) {
        let mut active = vec![id];
        self.bind_class(id, bound, collector, route, &mut active);
    }

    /// The substitution from the type variables of `id` to the arguments of `bound`.
    pub fn generic_type_binder(&self, id: ClassId, bound: &GenericRefType) -> Option<GenericTypeBinder> {
        match self.class(id).this_general_type() {
            JavaType::Generic(this) => GenericTypeBinder::extract_bindings(&this, bound),
            _ => None,
        }
    }

    fn bind_class(
        &self,
        id: ClassId,
        bound: &JavaType,
        collector: &mut BoundSuperCollector,
        route: Route,
        active: &mut Vec<ClassId>,
    ) {
        let binder = match bound {
            JavaType::Generic(b) => self.generic_type_binder(id, b),
            _ => None,
        };
        self.walk_supers(id, binder.as_ref(), collector, route, active);
    }

    fn walk_supers(
        &self,
        id: ClassId,
        binder: Option<&GenericTypeBinder>,
        collector: &mut BoundSuperCollector,
        route: Route,
        active: &mut Vec<ClassId>,
    ) {
        let signature = self.class(id).class_signature();
        if let Some(super_class) = &signature.super_class {
            self.bind_edge(super_class, binder, collector, route, active);
        }
        for interface in &signature.interfaces {
            self.bind_edge(interface, binder, collector, Route::Interface, active);
        }
    }

    fn bind_edge(
        &self,
        base: &JavaType,
        binder: Option<&GenericTypeBinder>,
        collector: &mut BoundSuperCollector,
        route: Route,
        active: &mut Vec<ClassId>,
    ) {
        let (bound, target) = match base {
            // nothing to substitute; ancestors are walked unbound
            JavaType::Ref(r) => (base.clone(), self.id_of(r)),
            JavaType::Generic(g) => (JavaType::Generic(g.bound_instance(binder)), self.id_of(&g.base)),
            other => {
                warn!(supertype = %other, "supertype is not a class type, ignoring");
                return;
            }
        };
        collector.collect(bound.clone(), route);
        let Some(target) = target else {
            return;
        };
        if active.contains(&target) {
            warn!(
                class = %self.class(target).class_type(),
                "inheritance cycle, not walking further"
            );
            return;
        }
        active.push(target);
        self.bind_class(target, &bound, collector, route, active);
        active.pop();
    }
}
