/// One loaded JVM type. Identity is the dotted fully qualified name.
#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub fqn: String,
    pub kind: ClassKind,
    pub super_fqn: Option<String>,
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    /// Look up a declared method by name and descriptor.
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodDecl> {
        self.methods
            .iter()
            .find(|method| method.name == name && method.descriptor == descriptor)
    }

    pub fn is_concrete_class(&self) -> bool {
        self.kind == ClassKind::Class
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClassKind {
    Class,
    Interface,
    AbstractClass,
}

/// One declared method, including constructors and class initializers.
#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub owner_fqn: String,
    pub name: String,
    pub descriptor: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_synthetic: bool,
    pub call_sites: Vec<CallSite>,
}

impl MethodDecl {
    pub fn to_ref(&self) -> MethodRef {
        MethodRef {
            owner: self.owner_fqn.clone(),
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

/// Invocation instruction extracted from a method body.
#[derive(Clone, Debug)]
pub struct CallSite {
    pub kind: CallKind,
    pub target: MethodRef,
    pub offset: u32,
}

/// The four JVM dispatch flavors. Special covers constructors, super-calls,
/// and private calls.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum CallKind {
    Static,
    Virtual,
    Interface,
    Special,
}

/// Symbolic method reference. May name a method that is not loaded; callers
/// tolerate failed resolution.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodRef {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl std::fmt::Display for MethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// Directed call edge, the externally observable unit of the graph. Identity
/// covers the full method triples so overloads stay distinct.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CallEdge {
    pub source: MethodRef,
    pub target: MethodRef,
}

impl CallEdge {
    pub fn new(source: MethodRef, target: MethodRef) -> Self {
        Self { source, target }
    }
}

/// Class summary emitted in the analysis result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassInfo {
    pub fqn: String,
    pub kind: ClassKind,
}

/// Method summary emitted in the analysis result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodInfo {
    pub owner_fqn: String,
    pub name: String,
    pub descriptor: String,
    pub visibility: Visibility,
    pub is_static: bool,
}

/// Analysis output handed to the serializers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnalysisResult {
    pub classes: Vec<ClassInfo>,
    pub methods: Vec<MethodInfo>,
    pub call_edges: Vec<CallEdge>,
}

/// Call-graph construction algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Algorithm {
    #[default]
    Cha,
    Rta,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Cha => write!(f, "CHA"),
            Algorithm::Rta => write!(f, "RTA"),
        }
    }
}
