//! Opaque identities for interceptable methods and constructors.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use bitflags::bitflags;
use strum::{Display, EnumIter};

/// How a method is invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum MethodKind {
    /// An instance method, called with a receiver.
    Instance,
    /// A static method, called without a receiver.
    Static,
    /// A constructor, called with the freshly allocated receiver.
    Constructor,
}

bitflags! {
    /// Descriptive attributes of a method.
    ///
    /// Flags are not part of a method's identity; they only feed the checks
    /// that decide whether a method can be intercepted at all.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u32 {
        /// The method has no body.
        const ABSTRACT = 0x0001;
        /// The method is declared on an interface.
        const INTERFACE = 0x0002;
        /// The method is implemented in native code.
        const NATIVE = 0x0004;
        /// The method was generated by the compiler.
        const SYNTHETIC = 0x0008;
    }
}

/// Name used for constructors in signatures and display.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// A stable key for one method or constructor of the target runtime.
///
/// Two `MethodId` values compare equal iff they denote the same underlying
/// method: same declaring type, name, signature, and [`MethodKind`]. How the
/// value was obtained (fresh reflection lookup, cached copy, clone) does not
/// matter, and [`MethodFlags`] are ignored for equality, hashing and ordering.
///
/// Cloning is cheap; all string parts are shared.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{MethodId, MethodKind};
///
/// let a = MethodId::method("android.app.Activity", "onCreate", "(Landroid/os/Bundle;)V");
/// let b = MethodId::method("android.app.Activity", "onCreate", "(Landroid/os/Bundle;)V");
/// assert_eq!(a, b);
///
/// let ctor = MethodId::constructor("java.lang.Thread", "()V");
/// assert_eq!(ctor.kind(), MethodKind::Constructor);
/// assert_eq!(ctor.to_string(), "java.lang.Thread#<init>()V");
/// ```
#[derive(Clone)]
pub struct MethodId {
    declaring_type: Arc<str>,
    name: Arc<str>,
    signature: Arc<str>,
    kind: MethodKind,
    flags: MethodFlags,
}

impl MethodId {
    /// Creates an identity for an instance method.
    #[must_use]
    pub fn method(
        declaring_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        signature: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(declaring_type, name, signature, MethodKind::Instance)
    }

    /// Creates an identity for a static method.
    #[must_use]
    pub fn static_method(
        declaring_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        signature: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(declaring_type, name, signature, MethodKind::Static)
    }

    /// Creates an identity for a constructor.
    #[must_use]
    pub fn constructor(declaring_type: impl Into<Arc<str>>, signature: impl Into<Arc<str>>) -> Self {
        Self::new(
            declaring_type,
            CONSTRUCTOR_NAME,
            signature,
            MethodKind::Constructor,
        )
    }

    /// Creates an identity from all of its parts.
    #[must_use]
    pub fn new(
        declaring_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        signature: impl Into<Arc<str>>,
        kind: MethodKind,
    ) -> Self {
        MethodId {
            declaring_type: declaring_type.into(),
            name: name.into(),
            signature: signature.into(),
            kind,
            flags: MethodFlags::empty(),
        }
    }

    /// Attaches descriptive flags.
    #[must_use]
    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Fully qualified name of the declaring type.
    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Method name (`<init>` for constructors).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter and return type descriptor.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// How the method is invoked.
    #[must_use]
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Descriptive flags.
    #[must_use]
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Returns true for constructors.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    /// Returns true for static methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.kind == MethodKind::Static
    }

    fn key(&self) -> (&str, &str, &str, MethodKind) {
        (
            &*self.declaring_type,
            &*self.name,
            &*self.signature,
            self.kind,
        )
    }
}

impl PartialEq for MethodId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MethodId {}

impl Hash for MethodId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for MethodId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MethodId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Debug for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodId")
            .field("method", &format_args!("{self}"))
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .finish()
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static() {
            write!(f, "static ")?;
        }
        write!(f, "{}#{}{}", self.declaring_type, self.name, self.signature)
    }
}
