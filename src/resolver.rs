//! Parameter resolution: dotted paths against the parameter graph.

use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use crate::{
    path::{CURRENT_ALIAS, PathSegment, PropertyPath},
    value::{ParamValue, TypeTag},
};

/// Supplies the root parameter object to templates.
///
/// Implement this to adapt host types; [`Parameters`] covers the common case.
pub trait ParameterProvider {
    /// Name templates use for the root object (`pmb` in `/*pmb.memberId*/`).
    fn root_name(&self) -> &str;

    fn root(&self) -> &ParamValue;

    /// Statically declared type of a root-relative path (`member.birthdate`),
    /// consulted only when the resolved value is null.
    fn declared_type(&self, _path: &str) -> Option<TypeTag> {
        None
    }
}

/// A root value plus optional declared types for its nullable properties.
#[derive(Debug, Clone)]
pub struct Parameters {
    root_name: String,
    root: ParamValue,
    declared_types: HashMap<String, TypeTag>,
}

impl Parameters {
    pub fn new(root_name: impl Into<String>, root: impl Into<ParamValue>) -> Self {
        Parameters {
            root_name: root_name.into(),
            root: root.into(),
            declared_types: HashMap::new(),
        }
    }

    /// Declare the static type of a root-relative path.
    pub fn declare(mut self, path: impl Into<String>, type_tag: TypeTag) -> Self {
        self.declared_types.insert(path.into(), type_tag);
        self
    }

    pub fn with_declared_types(mut self, types: HashMap<String, TypeTag>) -> Self {
        self.declared_types.extend(types);
        self
    }
}

impl ParameterProvider for Parameters {
    fn root_name(&self) -> &str {
        &self.root_name
    }

    fn root(&self) -> &ParamValue {
        &self.root
    }

    fn declared_type(&self, path: &str) -> Option<TypeTag> {
        self.declared_types.get(path).copied()
    }
}

/// State of one active FOR iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopContext {
    pub alias: String,
    pub element: ParamValue,
    pub declared_type: TypeTag,
    /// Zero-based
    pub index: usize,
    pub size: usize,
}

impl LoopContext {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.size
    }
}

/// Active loops, innermost last.
#[derive(Debug, Clone, Default)]
pub struct LoopStack {
    frames: Vec<LoopContext>,
}

impl LoopStack {
    pub fn push(&mut self, context: LoopContext) {
        self.frames.push(context);
    }

    pub fn pop(&mut self) -> Option<LoopContext> {
        self.frames.pop()
    }

    pub fn innermost(&self) -> Option<&LoopContext> {
        self.frames.last()
    }

    /// Innermost loop bound to `alias`.
    pub fn find(&self, alias: &str) -> Option<&LoopContext> {
        self.frames.iter().rev().find(|c| c.alias == alias)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Everything a path may resolve against during one evaluation.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub params: &'a dyn ParameterProvider,
    pub loops: &'a LoopStack,
}

impl<'a> Scope<'a> {
    pub fn new(params: &'a dyn ParameterProvider, loops: &'a LoopStack) -> Self {
        Scope { params, loops }
    }
}

/// A resolved value with its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: ParamValue,
    pub declared_type: TypeTag,
}

/// Errors raised while walking a property path.
///
/// A path that names something the parameter object does not have always
/// fails. `UnknownParameterName` covers the first segment (neither the root
/// name nor a loop alias); `PropertyNotFound` covers a missing property
/// further along, such as `pmb.doesNotExist`, and names the bean type that
/// lacks it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("unknown parameter name '{name}' in '{path}' (expected '{root_name}' or a loop alias)")]
    UnknownParameterName {
        name: String,
        path: String,
        root_name: String,
    },

    #[error("property '{property}' not found on {type_name} at '{path}'")]
    PropertyNotFound {
        property: String,
        type_name: String,
        path: String,
    },

    #[error("key '{key}' not found in map at '{path}'")]
    KeyNotFound { key: String, path: String },

    #[error("index {index} out of bounds for list of size {size} at '{path}'")]
    IndexOutOfBounds {
        index: usize,
        size: usize,
        path: String,
    },

    #[error("cannot navigate to '{segment}' through a {type_name} value at '{path}'")]
    NotNavigable {
        segment: String,
        type_name: &'static str,
        path: String,
    },
}

enum Origin<'a> {
    Root,
    Loop(&'a LoopContext),
}

/// Resolve `path` against the scope.
///
/// The first segment is matched against, in order: the innermost loop alias
/// with that name, the root parameter name, and finally `#current` as the
/// innermost loop element.
pub fn resolve(scope: &Scope<'_>, path: &PropertyPath) -> Result<Resolved, ResolveError> {
    let head = path.head();

    let (start, origin) = if let Some(context) = scope.loops.find(head) {
        (&context.element, Origin::Loop(context))
    } else if head == scope.params.root_name() {
        (scope.params.root(), Origin::Root)
    } else if let Some(context) = scope.loops.innermost().filter(|_| head == CURRENT_ALIAS) {
        (&context.element, Origin::Loop(context))
    } else {
        return Err(ResolveError::UnknownParameterName {
            name: head.to_string(),
            path: path.to_string(),
            root_name: scope.params.root_name().to_string(),
        });
    };

    let mut current = start;
    for segment in path.tail() {
        current = step(current, segment, path)?;
    }

    let declared_type = match current.type_tag() {
        Some(tag) => tag,
        None => match origin {
            Origin::Loop(context) if path.tail().is_empty() => context.declared_type,
            Origin::Root => scope
                .params
                .declared_type(&path.relative())
                .unwrap_or(TypeTag::Object),
            Origin::Loop(_) => TypeTag::Object,
        },
    };

    trace!(path = %path, declared_type = %declared_type, "resolved parameter");

    Ok(Resolved {
        value: current.clone(),
        declared_type,
    })
}

fn step<'v>(
    current: &'v ParamValue,
    segment: &PathSegment,
    path: &PropertyPath,
) -> Result<&'v ParamValue, ResolveError> {
    match (current, segment) {
        (ParamValue::Bean(bean), PathSegment::Property(name)) => {
            bean.property(name)
                .ok_or_else(|| ResolveError::PropertyNotFound {
                    property: name.clone(),
                    type_name: bean.type_name().to_string(),
                    path: path.to_string(),
                })
        }
        (ParamValue::Map(map), segment) => {
            let key = segment.to_string();
            map.get(&key).ok_or_else(|| ResolveError::KeyNotFound {
                key,
                path: path.to_string(),
            })
        }
        (ParamValue::List(items), PathSegment::Index(index)) => {
            items
                .get(*index)
                .ok_or_else(|| ResolveError::IndexOutOfBounds {
                    index: *index,
                    size: items.len(),
                    path: path.to_string(),
                })
        }
        (value, segment) => Err(ResolveError::NotNavigable {
            segment: segment.to_string(),
            type_name: value.type_name(),
            path: path.to_string(),
        }),
    }
}
