//! End-to-end extraction over a [`ProgramCatalog`].

use rayon::prelude::*;

use super::assembler::{ArchitectureAssembler, DeclarationModel};
use super::call_locator::CallSiteLocator;
use super::classifier::{Role, RoleClassifier};
use super::component_builder::ComponentCatalogBuilder;
use super::entity_builder::EntityModelBuilder;
use super::resolver::ExpressionResolver;
use crate::catalog::{Declaration, FieldDecl, MethodDecl, ProgramCatalog};
use crate::config::{ConfigDocument, ExtractionSettings};
use crate::error::Result;
use crate::model::{reason, Module, ResolvedExpression, RestCall};

/// Classification outcome of one declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub name: String,
    pub role: Option<Role>,
}

pub struct Extractor {
    settings: ExtractionSettings,
    config: ConfigDocument,
}

impl Extractor {
    pub fn new(settings: ExtractionSettings, config: ConfigDocument) -> Self {
        Self { settings, config }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Runs extraction over every reachable declaration.
    ///
    /// Fails only when the catalog cannot list declarations; a failure on one
    /// declaration is logged and that declaration is left out.
    pub fn run(&self, catalog: &dyn ProgramCatalog) -> Result<Module> {
        let names = self.analysed_declarations(catalog)?;
        tracing::info!("Extracting architecture from {} declarations", names.len());

        let assembler = if self.settings.parallel {
            names
                .par_iter()
                .fold(
                    || ArchitectureAssembler::new(self.settings.module_name.clone()),
                    |mut shard, name| {
                        if let Some(model) = self.extract_logged(catalog, name) {
                            shard.absorb(model);
                        }
                        shard
                    },
                )
                .reduce(
                    || ArchitectureAssembler::new(self.settings.module_name.clone()),
                    |mut left, right| {
                        left.merge(right);
                        left
                    },
                )
        } else {
            let mut assembler = ArchitectureAssembler::new(self.settings.module_name.clone());
            for name in &names {
                if let Some(model) = self.extract_logged(catalog, name) {
                    assembler.absorb(model);
                }
            }
            assembler
        };

        let module = assembler.finish();
        tracing::info!(
            "Module {}: {} entities, {} services, {} controllers, {} endpoints, {} rest calls",
            module.name(),
            module.entities().len(),
            module.services().len(),
            module.controllers().len(),
            module.endpoints().len(),
            module.rest_calls().len()
        );
        Ok(module)
    }

    /// Classifies every analysed declaration without building records
    pub fn classify(&self, catalog: &dyn ProgramCatalog) -> Result<Vec<Classification>> {
        let classifier = RoleClassifier::new(&self.settings);
        let mut results = Vec::new();

        for name in self.analysed_declarations(catalog)? {
            let role = match self.load(catalog, &name) {
                Ok((declaration, fields, methods)) => {
                    classifier.classify(&declaration, &fields, &methods)
                }
                Err(e) => {
                    tracing::warn!("Skipping declaration {}: {}", name, e);
                    continue;
                }
            };
            results.push(Classification { name, role });
        }

        Ok(results)
    }

    fn analysed_declarations(&self, catalog: &dyn ProgramCatalog) -> Result<Vec<String>> {
        Ok(catalog
            .reachable_declarations()?
            .into_iter()
            .filter(|name| self.settings.includes(name))
            .collect())
    }

    fn extract_logged(&self, catalog: &dyn ProgramCatalog, name: &str) -> Option<DeclarationModel> {
        match self.extract_declaration(catalog, name) {
            Ok(model) if model.is_empty() => None,
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!("Skipping declaration {}: {}", name, e);
                None
            }
        }
    }

    fn load(
        &self,
        catalog: &dyn ProgramCatalog,
        name: &str,
    ) -> Result<(Declaration, Vec<FieldDecl>, Vec<MethodDecl>)> {
        let declaration = catalog.lookup_declaration(name)?;
        let fields = catalog.declared_fields(&declaration)?;
        let methods = catalog.declared_methods(&declaration)?;
        Ok((declaration, fields, methods))
    }

    /// Extracts the records of a single declaration
    pub fn extract_declaration(
        &self,
        catalog: &dyn ProgramCatalog,
        name: &str,
    ) -> Result<DeclarationModel> {
        let (declaration, fields, methods) = self.load(catalog, name)?;
        let role = RoleClassifier::new(&self.settings).classify(&declaration, &fields, &methods);
        tracing::debug!(
            "Declaration {} classified as {}",
            name,
            role.map(|r| r.as_str()).unwrap_or("none")
        );

        let mut model = DeclarationModel::default();
        let components = ComponentCatalogBuilder::new(&self.settings);

        match role {
            None => return Ok(model),
            Some(Role::Entity) => {
                model.entity =
                    Some(EntityModelBuilder::new(&self.settings).build(&declaration, &fields));
            }
            Some(Role::Service) => {
                model.service = Some(components.build(&declaration, &fields, &methods));
            }
            Some(Role::Controller) => {
                model.controller = Some(components.build(&declaration, &fields, &methods));
                model.endpoints = components.endpoints(&declaration, &methods);
            }
        }

        if self.settings.extract_rest_calls && role != Some(Role::Entity) {
            model.rest_calls = self.rest_calls(catalog, &methods);
        }

        Ok(model)
    }

    fn rest_calls(&self, catalog: &dyn ProgramCatalog, methods: &[MethodDecl]) -> Vec<RestCall> {
        let locator = CallSiteLocator::new(&self.settings);
        let resolver = ExpressionResolver::new(&self.settings, &self.config);
        let mut calls = Vec::new();

        for method in methods {
            let graph = match catalog.program_graph_of(method) {
                Ok(graph) => graph,
                Err(e) => {
                    tracing::debug!("No program graph for {}: {}", method.qualified_name(), e);
                    continue;
                }
            };

            for site in locator.locate(method, &graph) {
                let address = match site.address() {
                    Some(node) => resolver.resolve(&graph, node),
                    None => ResolvedExpression::unknown(reason::MISSING_ADDRESS),
                };
                tracing::debug!("{} calls {} with address {}", site.method, site.target, address);
                calls.push(RestCall {
                    method: site.method,
                    target: site.target,
                    address,
                });
            }
        }

        calls
    }
}
