//! Dependency - a resolution request plus its injection stack
//!
//! The stack holds one [`Injection`] frame per resource currently producing
//! an instance, innermost last. Frames are shared: pushing copies the
//! (short) stack into a new `Arc<[Injection]>` and leaves the parent intact.

use std::fmt;
use std::sync::Arc;

use crate::types::Type;
use crate::util::intern;

use super::{Instance, Name};

/// One frame of the injection stack
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Injection {
    /// What was asked for
    pub requested: Instance,
    /// What the serving resource provides
    pub provided: Instance,
    /// Serial of the serving resource
    pub serial: usize,
}

impl Injection {
    pub fn new(requested: Instance, provided: Instance, serial: usize) -> Self {
        Self {
            requested,
            provided,
            serial,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dependency {
    instance: Instance,
    stack: Arc<[Injection]>,
    package: Option<Arc<str>>,
}

impl Dependency {
    /// Top-level request with an empty stack
    pub fn new(instance: Instance) -> Self {
        Self {
            instance,
            stack: Arc::from(Vec::new()),
            package: None,
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

    /// Request made on behalf of code living in `package`
    pub fn from_package(mut self, package: &str) -> Self {
        self.package = Some(intern(package));
        self
    }

    /// Another request on the same stack
    ///
    /// The requester becomes the innermost frame, so an explicit package is
    /// not carried over.
    pub fn instanced(&self, instance: Instance) -> Self {
        Self {
            instance,
            stack: Arc::clone(&self.stack),
            package: None,
        }
    }

    /// This request with the serving resource pushed as innermost frame
    pub fn push(&self, provided: Instance, serial: usize) -> Self {
        let mut frames: Vec<Injection> = Vec::with_capacity(self.stack.len() + 1);
        frames.extend(self.stack.iter().cloned());
        frames.push(Injection::new(self.instance.clone(), provided, serial));
        Self {
            instance: self.instance.clone(),
            stack: Arc::from(frames),
            package: self.package.clone(),
        }
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

    pub fn stack(&self) -> &[Injection] {
        &self.stack
    }

    pub fn innermost(&self) -> Option<&Injection> {
        self.stack.last()
    }

    /// Package of the requesting code
    ///
    /// An explicit package wins; otherwise the innermost frame's provided
    /// type decides. Top-level requests without either have none.
    pub fn requester_package(&self) -> Option<&str> {
        if let Some(package) = &self.package {
            return Some(package);
        }
        self.stack
            .last()
            .and_then(|frame| frame.provided.ty().raw_type().package())
    }

    /// Array requests are served as collections
    pub fn is_multi(&self) -> bool {
        self.ty().is_array()
    }

    /// Request for one element of an array request, on the same stack
    pub fn element(&self) -> Self {
        Self {
            instance: self.instance.typed(self.ty().element_type()),
            stack: Arc::clone(&self.stack),
            package: self.package.clone(),
        }
    }

    /// Whether the resource `serial` is already producing on this stack
    pub fn is_serving(&self, serial: usize) -> bool {
        self.stack.iter().any(|frame| frame.serial == serial)
    }

    /// `A -> B -> A` from the first frame served by `serial`
    pub fn cycle_through(&self, serial: usize) -> String {
        let start = self
            .stack
            .iter()
            .position(|frame| frame.serial == serial)
            .unwrap_or(0);
        let mut path: Vec<String> = self.stack[start..]
            .iter()
            .map(|frame| frame.requested.to_string())
            .collect();
        path.push(self.instance.to_string());
        path.join(" -> ")
    }

    /// Signature of the requested type
    ///
    /// The upper-bound flag is dropped, matching type equality.
    pub fn type_signature(&self) -> String {
        self.ty().as_exact().to_string()
    }

    /// Signature of the requested type and name
    pub fn instance_signature(&self) -> String {
        format!("{}#{}", self.ty().as_exact(), self.name())
    }

    /// Requested instance followed by every frame's provided instance
    pub fn target_signature(&self) -> String {
        let mut signature = self.instance_signature();
        for frame in self.stack.iter().rev() {
            signature.push_str(" < ");
            signature.push_str(&format!(
                "{}#{}",
                frame.provided.ty().as_exact(),
                frame.provided.name()
            ));
        }
        signature
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instance)?;
        if !self.stack.is_empty() {
            f.write_str(" (via ")?;
            for (i, frame) in self.stack.iter().rev().enumerate() {
                if i > 0 {
                    f.write_str(" <- ")?;
                }
                write!(f, "{}", frame.provided)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Wheel;
    struct Car;
    struct Garage;

    fn wheel_in_car_in_garage() -> Dependency {
        Dependency::of::<Garage>()
            .push(Instance::of::<Garage>(), 7)
            .instanced(Instance::of::<Car>())
            .push(Instance::of::<Car>(), 3)
            .instanced(Instance::of::<Wheel>())
    }

    #[test]
    fn push_leaves_parent_untouched() {
        let root = Dependency::of::<Car>();
        let pushed = root.push(Instance::of::<Car>(), 1);
        assert!(root.stack().is_empty());
        assert_eq!(pushed.stack().len(), 1);
        assert!(pushed.is_serving(1));
        assert!(!root.is_serving(1));
    }

    #[test]
    fn requester_package_follows_innermost_frame() {
        let dep = wheel_in_car_in_garage();
        assert_eq!(
            dep.requester_package(),
            Some("weft::model::dependency::tests")
        );
        assert_eq!(Dependency::of::<Wheel>().requester_package(), None);
        let explicit = Dependency::of::<Wheel>().from_package("app::ui");
        assert_eq!(explicit.requester_package(), Some("app::ui"));
    }

    #[test]
    fn display_shows_the_stack_innermost_first() {
        let shown = wheel_in_car_in_garage().to_string();
        let car = std::any::type_name::<Car>();
        let garage = std::any::type_name::<Garage>();
        assert!(shown.contains(&format!("(via {} <- {})", car, garage)));
    }

    #[test]
    fn cycle_path_starts_at_the_repeated_frame() {
        let dep = wheel_in_car_in_garage();
        let path = dep.cycle_through(3);
        assert!(path.starts_with(std::any::type_name::<Car>()));
        assert!(path.ends_with(std::any::type_name::<Wheel>()));
    }

    #[test]
    fn element_keeps_the_stack() {
        let array = Dependency::typed(Type::of::<Wheel>().array());
        assert!(array.is_multi());
        let element = array.element();
        assert!(!element.is_multi());
        assert_eq!(element.ty(), &Type::of::<Wheel>());
    }

    #[test]
    fn signatures_widen_with_context() {
        let dep = wheel_in_car_in_garage();
        assert!(dep.instance_signature().starts_with(&dep.type_signature()));
        assert!(dep.target_signature().starts_with(&dep.instance_signature()));
        assert!(dep.target_signature().contains(" < "));
    }
}
