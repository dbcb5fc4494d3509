use serde::{Deserialize, Serialize};

use super::component::{Controller, Endpoint, Service};
use super::entity::Entity;
use super::expression::RestCall;
use super::names::Name;

/// The assembled architecture model of one application module.
///
/// Built only by the assembler; every collection is sorted and deduplicated,
/// so two runs over the same snapshot compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    name: Name,
    entities: Vec<Entity>,
    services: Vec<Service>,
    controllers: Vec<Controller>,
    endpoints: Vec<Endpoint>,
    rest_calls: Vec<RestCall>,
}

impl Module {
    pub(crate) fn from_parts(
        name: Name,
        entities: Vec<Entity>,
        services: Vec<Service>,
        controllers: Vec<Controller>,
        endpoints: Vec<Endpoint>,
        rest_calls: Vec<RestCall>,
    ) -> Self {
        Self {
            name,
            entities,
            services,
            controllers,
            endpoints,
            rest_calls,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn rest_calls(&self) -> &[RestCall] {
        &self.rest_calls
    }

    pub fn entity(&self, key: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name.key() == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.services.is_empty()
            && self.controllers.is_empty()
            && self.endpoints.is_empty()
            && self.rest_calls.is_empty()
    }
}
