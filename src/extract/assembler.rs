//! Folds per-declaration records into one [`Module`].

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Component, Endpoint, Entity, Module, Name, RestCall};

/// Records extracted from a single declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationModel {
    pub entity: Option<Entity>,
    pub service: Option<Component>,
    pub controller: Option<Component>,
    pub endpoints: Vec<Endpoint>,
    pub rest_calls: Vec<RestCall>,
}

impl DeclarationModel {
    pub fn is_empty(&self) -> bool {
        self.entity.is_none()
            && self.service.is_none()
            && self.controller.is_none()
            && self.endpoints.is_empty()
            && self.rest_calls.is_empty()
    }
}

/// Merge step of extraction.
///
/// Entities are keyed by qualified name and their field sets merged on
/// collision; every other record is deduplicated by structural equality.
#[derive(Debug, Clone)]
pub struct ArchitectureAssembler {
    name: Name,
    entities: BTreeMap<String, Entity>,
    services: BTreeSet<Component>,
    controllers: BTreeSet<Component>,
    endpoints: BTreeSet<Endpoint>,
    rest_calls: BTreeSet<RestCall>,
}

impl ArchitectureAssembler {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            name: Name::new(module_name),
            entities: BTreeMap::new(),
            services: BTreeSet::new(),
            controllers: BTreeSet::new(),
            endpoints: BTreeSet::new(),
            rest_calls: BTreeSet::new(),
        }
    }

    pub fn add_entity(&mut self, entity: Entity) {
        let key = entity.name.key().to_string();
        match self.entities.get_mut(&key) {
            Some(existing) => {
                tracing::debug!("Merging duplicate entity {}", key);
                existing.merge(entity);
            }
            None => {
                self.entities.insert(key, entity);
            }
        }
    }

    pub fn add_service(&mut self, service: Component) {
        self.services.insert(service);
    }

    pub fn add_controller(&mut self, controller: Component) {
        self.controllers.insert(controller);
    }

    pub fn add_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoints.insert(endpoint);
    }

    pub fn add_rest_call(&mut self, call: RestCall) {
        self.rest_calls.insert(call);
    }

    pub fn absorb(&mut self, model: DeclarationModel) {
        if let Some(entity) = model.entity {
            self.add_entity(entity);
        }
        if let Some(service) = model.service {
            self.add_service(service);
        }
        if let Some(controller) = model.controller {
            self.add_controller(controller);
        }
        self.endpoints.extend(model.endpoints);
        self.rest_calls.extend(model.rest_calls);
    }

    /// Joins another partial assembly, e.g. from a worker shard
    pub fn merge(&mut self, other: ArchitectureAssembler) {
        for entity in other.entities.into_values() {
            self.add_entity(entity);
        }
        self.services.extend(other.services);
        self.controllers.extend(other.controllers);
        self.endpoints.extend(other.endpoints);
        self.rest_calls.extend(other.rest_calls);
    }

    pub fn finish(self) -> Module {
        Module::from_parts(
            self.name,
            self.entities.into_values().collect(),
            self.services.into_iter().collect(),
            self.controllers.into_iter().collect(),
            self.endpoints.into_iter().collect(),
            self.rest_calls.into_iter().collect(),
        )
    }
}
