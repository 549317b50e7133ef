//! Store of the type infos synthesized during one schema build.
//!
//! Infos are registered in a fixed order (unions, enums, interfaces, objects,
//! inputs). Their fields, interfaces and members are only computed once every
//! info is registered, so declarations may reference types declared later.

use std::collections::HashMap;
use std::sync::Arc;

use crate::metadata::{ClassMetadata, ClassTable, EnumId, EnumMetadata, TargetId, UnionId, UnionMetadata};
use crate::resolvers::{AbstractKind, AbstractTypeResolver, EnumMapping};

pub(crate) struct EnumTypeInfo<'a> {
    pub metadata: &'a EnumMetadata,
    pub mapping: Arc<EnumMapping>,
}

pub(crate) struct UnionTypeInfo<'a> {
    pub metadata: &'a UnionMetadata,
    pub resolver: Arc<AbstractTypeResolver>,
}

pub(crate) struct InterfaceTypeInfo<'a> {
    pub metadata: &'a ClassMetadata,
    pub resolver: Arc<AbstractTypeResolver>,
}

#[derive(Default)]
pub(crate) struct TypesInfo<'a> {
    pub unions: Vec<UnionTypeInfo<'a>>,
    pub enums: Vec<EnumTypeInfo<'a>>,
    pub interfaces: Vec<InterfaceTypeInfo<'a>>,
    pub objects: Vec<&'a ClassMetadata>,
    pub inputs: Vec<&'a ClassMetadata>,
    union_index: HashMap<UnionId, usize>,
    enum_index: HashMap<EnumId, usize>,
    interface_index: HashMap<TargetId, usize>,
    object_index: HashMap<TargetId, usize>,
    input_index: HashMap<TargetId, usize>,
}

impl<'a> TypesInfo<'a> {
    pub fn add_union(&mut self, info: UnionTypeInfo<'a>) {
        self.union_index.insert(info.metadata.id, self.unions.len());
        self.unions.push(info);
    }

    pub fn add_enum(&mut self, info: EnumTypeInfo<'a>) {
        self.enum_index.insert(info.metadata.id, self.enums.len());
        self.enums.push(info);
    }

    pub fn add_interface(&mut self, info: InterfaceTypeInfo<'a>) {
        self.interface_index
            .insert(info.metadata.target, self.interfaces.len());
        self.interfaces.push(info);
    }

    pub fn add_object(&mut self, metadata: &'a ClassMetadata) {
        self.object_index.insert(metadata.target, self.objects.len());
        self.objects.push(metadata);
    }

    pub fn add_input(&mut self, metadata: &'a ClassMetadata) {
        self.input_index.insert(metadata.target, self.inputs.len());
        self.inputs.push(metadata);
    }

    pub fn find_union(&self, id: UnionId) -> Option<&UnionTypeInfo<'a>> {
        self.union_index.get(&id).map(|&index| &self.unions[index])
    }

    pub fn find_enum(&self, id: EnumId) -> Option<&EnumTypeInfo<'a>> {
        self.enum_index.get(&id).map(|&index| &self.enums[index])
    }

    pub fn find_interface(&self, target: TargetId) -> Option<&InterfaceTypeInfo<'a>> {
        self.interface_index
            .get(&target)
            .map(|&index| &self.interfaces[index])
    }

    pub fn find_object(&self, target: TargetId) -> Option<&'a ClassMetadata> {
        self.object_index.get(&target).map(|&index| self.objects[index])
    }

    pub fn find_input(&self, target: TargetId) -> Option<&'a ClassMetadata> {
        self.input_index.get(&target).map(|&index| self.inputs[index])
    }
}

/// Looks up the registered supertype of a class in one category.
pub(crate) struct SuperClassSearcher<'a> {
    pub classes: &'a ClassTable,
}

impl<'a> SuperClassSearcher<'a> {
    pub fn object_type<'i>(&self, info: &TypesInfo<'i>, class: &ClassMetadata) -> Option<&'i ClassMetadata> {
        self.classes
            .parent(class.target)
            .and_then(|parent| info.find_object(parent))
    }

    pub fn input_type<'i>(&self, info: &TypesInfo<'i>, class: &ClassMetadata) -> Option<&'i ClassMetadata> {
        self.classes
            .parent(class.target)
            .and_then(|parent| info.find_input(parent))
    }

    pub fn interface_type<'i>(
        &self,
        info: &TypesInfo<'i>,
        class: &ClassMetadata,
    ) -> Option<&'i ClassMetadata> {
        self.classes
            .parent(class.target)
            .and_then(|parent| info.find_interface(parent))
            .map(|interface| interface.metadata)
    }

    /// Interfaces an object type implements, own first, then those inherited
    /// from its registered supertypes. Duplicates are dropped.
    pub fn object_interfaces(&self, info: &TypesInfo<'_>, class: &ClassMetadata) -> Vec<TargetId> {
        let mut interfaces: Vec<TargetId> = Vec::new();
        let mut current = Some(class);
        while let Some(object) = current {
            for interface in &object.interfaces {
                if !interfaces.contains(interface) {
                    interfaces.push(*interface);
                }
            }
            current = self.object_type(info, object);
        }
        interfaces
    }
}

/// Builds the resolver picking the concrete member of a union.
pub(crate) fn union_resolver(
    metadata: &UnionMetadata,
    objects: &[&ClassMetadata],
    classes: &Arc<ClassTable>,
) -> Arc<AbstractTypeResolver> {
    let candidates = metadata
        .types
        .iter()
        .filter_map(|member| {
            objects
                .iter()
                .find(|object| object.target == *member)
                .map(|object| (object.target, object.name.clone()))
        })
        .collect();
    Arc::new(AbstractTypeResolver {
        type_name: metadata.name.clone(),
        kind: AbstractKind::Union,
        candidates,
        classes: Arc::clone(classes),
    })
}

/// Builds the resolver picking the concrete implementation of an interface.
///
/// Candidates are the object types implementing the interface directly or
/// through a registered supertype.
pub(crate) fn interface_resolver(
    metadata: &ClassMetadata,
    objects: &[&ClassMetadata],
    classes: &Arc<ClassTable>,
) -> Arc<AbstractTypeResolver> {
    let implements = |object: &ClassMetadata| {
        let mut current = Some(object);
        while let Some(class) = current {
            if class.interfaces.contains(&metadata.target) {
                return true;
            }
            current = classes
                .parent(class.target)
                .and_then(|parent| objects.iter().copied().find(|o| o.target == parent));
        }
        false
    };
    let candidates = objects
        .iter()
        .filter(|object| implements(object))
        .map(|object| (object.target, object.name.clone()))
        .collect();
    Arc::new(AbstractTypeResolver {
        type_name: metadata.name.clone(),
        kind: AbstractKind::Interface,
        candidates,
        classes: Arc::clone(classes),
    })
}
