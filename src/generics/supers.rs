use crate::signature::{JavaType, RefType};

/// How an ancestor was reached from the class being bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Identity,
    Extension,
    Interface,
}

/// One ancestor in bound form together with the route that reached it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundSuper {
    pub bound_type: JavaType,
    pub route: Route,
}

/// Accumulates ancestors during a walk, in discovery order.
#[derive(Debug, Default)]
pub struct BoundSuperCollector {
    records: Vec<BoundSuper>,
}

impl BoundSuperCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, bound_type: JavaType, route: Route) {
        self.records.push(BoundSuper { bound_type, route });
    }

    pub fn records(&self) -> &[BoundSuper] {
        &self.records
    }

    pub fn into_container(self, owner: RefType) -> BindingSuperContainer {
        BindingSuperContainer {
            owner,
            records: self.records,
        }
    }
}

/// Every bound ancestor of one class, itself first.
///
/// A type reached through several routes appears once per route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingSuperContainer {
    owner: RefType,
    records: Vec<BoundSuper>,
}

impl BindingSuperContainer {
    pub fn owner(&self) -> &RefType {
        &self.owner
    }

    pub fn records(&self) -> &[BoundSuper] {
        &self.records
    }

    pub fn routes(&self) -> Vec<Route> {
        self.records.iter().map(|r| r.route).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first bound form recorded for `base`.
    pub fn bound_super_for_base<'a>(&'a self, base: &RefType) -> Option<&'a JavaType> {
        self.records
            .iter()
            .find(|r| r.bound_type.ref_type() == Some(base))
            .map(|r| &r.bound_type)
    }

    pub fn records_for_base<'a>(
        &'a self,
        base: &'a RefType,
    ) -> impl Iterator<Item = &'a BoundSuper> + 'a {
        self.records
            .iter()
            .filter(move |r| r.bound_type.ref_type() == Some(base))
    }

    pub fn contains_base(&self, base: &RefType) -> bool {
        self.records_for_base(base).next().is_some()
    }
}
