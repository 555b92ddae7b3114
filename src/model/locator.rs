//! Locator - left-hand side of a binding
//!
//! What is provided (instance), where it may be injected (target) and where
//! the requester must live (packages).

use std::fmt;

use crate::types::Type;

use super::{Dependency, Instance, Name, Packages, Qualifying, Target};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    instance: Instance,
    target: Target,
    packages: Packages,
}

impl Locator {
    pub fn new(instance: Instance) -> Self {
        Self {
            instance,
            target: Target::any(),
            packages: Packages::all(),
        }
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(Instance::of::<T>())
    }

    pub fn named<T: ?Sized + 'static>(name: impl Into<Name>) -> Self {
        Self::new(Instance::named::<T>(name))
    }

    pub fn typed(ty: Type) -> Self {
        Self::new(Instance::default_of(ty))
    }

    pub fn with_name(mut self, name: impl Into<Name>) -> Self {
        self.instance = Instance::new(name.into(), self.instance.ty().clone());
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Shorthand for a single-frame target
    pub fn injecting_into(self, instance: Instance) -> Self {
        self.with_target(Target::injecting_into(instance))
    }

    pub fn in_packages(mut self, packages: Packages) -> Self {
        self.packages = packages;
        self
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn name(&self) -> &Name {
        self.instance.name()
    }

    pub fn ty(&self) -> &Type {
        self.instance.ty()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn packages(&self) -> &Packages {
        &self.packages
    }

    /// Whether a resource under this locator can serve `dependency`
    pub fn is_compatible_with(&self, dependency: &Dependency) -> bool {
        let requested = dependency.instance();
        self.instance.name().accepts(requested.name())
            && self.instance.ty().serves(requested.ty())
            && self.packages.contains(dependency.requester_package())
            && self.target.is_available_for(dependency.stack())
    }

    /// Same raw type, incompatible otherwise; used for error reporting
    pub fn is_near_miss_for(&self, dependency: &Dependency) -> bool {
        self.ty().raw_type() == dependency.ty().raw_type() && !self.is_compatible_with(dependency)
    }
}

impl Qualifying for Locator {
    /// (name, packages, target, type)
    type Rank = (
        <Name as Qualifying>::Rank,
        <Packages as Qualifying>::Rank,
        <Target as Qualifying>::Rank,
        <Type as Qualifying>::Rank,
    );

    fn rank(&self) -> Self::Rank {
        (
            self.instance.name().rank(),
            self.packages.rank(),
            self.target.rank(),
            self.instance.ty().rank(),
        )
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instance)?;
        if !self.target.is_unscoped() {
            write!(f, " -> {}", self.target)?;
        }
        if !self.packages.is_all() {
            write!(f, " in {}", self.packages)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Engine;
    struct Car;

    fn engine_for_car() -> Dependency {
        Dependency::of::<Car>()
            .push(Instance::of::<Car>(), 0)
            .instanced(Instance::of::<Engine>())
    }

    #[test]
    fn compatible_when_every_part_agrees() {
        let locator = Locator::named::<Engine>("v8");
        assert!(locator.is_compatible_with(&Dependency::named::<Engine>("v8")));
        assert!(locator.is_compatible_with(&Dependency::named::<Engine>("*")));
        assert!(!locator.is_compatible_with(&Dependency::of::<Engine>()));
        assert!(!locator.is_compatible_with(&Dependency::of::<Car>()));
    }

    #[test]
    fn packages_filter_by_requester() {
        let locator = Locator::of::<Engine>().in_packages(Packages::package_of::<Car>());
        let top_level = Dependency::of::<Engine>();
        assert!(!locator.is_compatible_with(&top_level));
        assert!(locator.is_near_miss_for(&top_level));

        assert!(locator.is_compatible_with(&engine_for_car()));
    }

    #[test]
    fn targets_filter_by_stack() {
        let locator = Locator::of::<Engine>().injecting_into(Instance::of::<Car>());
        assert!(!locator.is_compatible_with(&Dependency::of::<Engine>()));
        assert!(locator.is_compatible_with(&engine_for_car()));
    }

    #[test]
    fn name_outranks_packages_and_target() {
        let named = Locator::named::<Engine>("v8");
        let targeted = Locator::of::<Engine>()
            .injecting_into(Instance::of::<Car>())
            .in_packages(Packages::package_of::<Car>());
        assert!(named.more_qualified_than(&targeted));
        assert!(targeted.more_qualified_than(&Locator::of::<Engine>()));
    }

    #[test]
    fn display_mentions_constraints() {
        let locator = Locator::of::<Engine>().in_packages(Packages::package("app"));
        assert!(locator.to_string().ends_with(" in app"));
    }
}
