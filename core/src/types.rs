//! Schema type definitions for workspace template content.
//!
//! This module defines the document under composition,
//! [`TemplateSpecContent`], together with commands, projects, starter
//! projects and event bindings. Components live in
//! [`components`](crate::components) and override documents in
//! [`overrides`](crate::overrides).
//!
//! Every leaf field is optional (or an empty-by-default collection) so the
//! same element types can express both complete documents and the partial
//! elements of an override patch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Component, Union, UnionError, UnionTree, UnionWalker};

/// Open-ended key/value bag attached to content and commands.
///
/// Values are free-form; overriding merges attribute maps key-wise.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Environment variable set in a container or for an exec command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value; empty when unset.
    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Network exposure of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndpointExposure {
    /// Reachable from outside the workspace.
    Public,
    /// Reachable only from inside the workspace.
    Internal,
    /// Not exposed at all.
    None,
}

/// Port exposed by a container or Kubernetes-like component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Endpoint name, unique within its component.
    pub name: String,
    /// Port the component listens on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    /// How far the endpoint is exposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<EndpointExposure>,
    /// Application protocol, e.g. `http` or `tcp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Path appended to the endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether the endpoint is served over TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// Free-form endpoint attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, target_port: u16) -> Self {
        Self {
            name: name.into(),
            target_port: Some(target_port),
            ..Default::default()
        }
    }
}

/// Kind of group a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandGroupKind {
    /// Builds the projects.
    Build,
    /// Runs the application.
    Run,
    /// Runs the tests.
    Test,
    /// Starts the application under a debugger.
    Debug,
    /// Deploys the application.
    Deploy,
}

/// Group membership of a command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandGroup {
    /// Group the command belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CommandGroupKind>,
    /// Whether this is the default command of its group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// Command-line executed in a component container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommand {
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Shell command line to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    /// Component the command runs in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Working directory of the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Argument vector; always replaced wholesale when overridden.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment variables, merged by name when overridden.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    /// Whether the command picks up source changes without a restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_reload_capable: Option<bool>,
    /// Group membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<CommandGroup>,
}

/// Applies the resources of a component (e.g. a Kubernetes manifest).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCommand {
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Component whose resources are applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Group membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<CommandGroup>,
}

/// Runs several other commands, sequentially or in parallel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeCommand {
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Ids of the sub-commands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    /// Whether the sub-commands run concurrently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    /// Group membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<CommandGroup>,
}

/// Implementation-defined command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCommand {
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Class interpreting the embedded resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_class: Option<String>,
    /// Opaque command definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_resource: Option<serde_json::Value>,
    /// Group membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<CommandGroup>,
}

/// Discriminator of [`CommandUnion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandType {
    /// The `exec` slot.
    Exec,
    /// The `apply` slot.
    Apply,
    /// The `composite` slot.
    Composite,
    /// The `custom` slot.
    Custom,
}

/// Variant slots of a [`Command`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandUnion {
    /// Discriminator; set by normalization, stripped by simplification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_type: Option<CommandType>,
    /// Command line run in a container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecCommand>,
    /// Resources of a component to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply: Option<ApplyCommand>,
    /// Group of other commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeCommand>,
    /// Implementation-defined command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomCommand>,
}

/// Borrowed view of the authoritative slot of a [`CommandUnion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandVariant<'a> {
    /// Exec command.
    Exec(&'a ExecCommand),
    /// Apply command.
    Apply(&'a ApplyCommand),
    /// Composite command.
    Composite(&'a CompositeCommand),
    /// Custom command.
    Custom(&'a CustomCommand),
}

impl CommandUnion {
    /// Returns the authoritative slot, or `None` if the union is empty,
    /// ambiguous, or its discriminator names an empty slot.
    pub fn variant(&self) -> Option<CommandVariant<'_>> {
        Some(match self.active()? {
            CommandType::Exec => CommandVariant::Exec(self.exec.as_ref()?),
            CommandType::Apply => CommandVariant::Apply(self.apply.as_ref()?),
            CommandType::Composite => CommandVariant::Composite(self.composite.as_ref()?),
            CommandType::Custom => CommandVariant::Custom(self.custom.as_ref()?),
        })
    }
}

impl Union for CommandUnion {
    type Tag = CommandType;
    const UNION_TYPE: &'static str = "CommandUnion";

    fn discriminator(&self) -> Option<CommandType> {
        self.command_type
    }

    fn set_discriminator(&mut self, tag: Option<CommandType>) {
        self.command_type = tag;
    }

    fn populated(&self) -> Vec<CommandType> {
        let mut tags = Vec::new();
        if self.exec.is_some() {
            tags.push(CommandType::Exec);
        }
        if self.apply.is_some() {
            tags.push(CommandType::Apply);
        }
        if self.composite.is_some() {
            tags.push(CommandType::Composite);
        }
        if self.custom.is_some() {
            tags.push(CommandType::Custom);
        }
        tags
    }

    fn retain_only(&mut self, tag: CommandType) {
        if tag != CommandType::Exec {
            self.exec = None;
        }
        if tag != CommandType::Apply {
            self.apply = None;
        }
        if tag != CommandType::Composite {
            self.composite = None;
        }
        if tag != CommandType::Custom {
            self.custom = None;
        }
    }
}

impl UnionTree for CommandUnion {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.visit(self)
    }
}

/// Predefined, ready-to-use workspace command.
///
/// # Examples
///
/// ```
/// use devtemplate_core::*;
///
/// let build = Command::exec("build", "cargo build").with_component("tools");
/// match build.union.variant() {
///     Some(CommandVariant::Exec(exec)) => {
///         assert_eq!(exec.component.as_deref(), Some("tools"));
///     }
///     other => panic!("unexpected variant {other:?}"),
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Identifier used by events, composite commands and overrides.
    #[serde(default)]
    pub id: String,
    /// Free-form command attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    /// Variant slots, flattened into the command.
    #[serde(flatten)]
    pub union: CommandUnion,
}

impl Command {
    /// Creates an exec command.
    pub fn exec(id: impl Into<String>, command_line: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
            union: CommandUnion {
                exec: Some(ExecCommand {
                    command_line: Some(command_line.into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    /// Creates an apply command for `component`.
    pub fn apply(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
            union: CommandUnion {
                apply: Some(ApplyCommand {
                    component: Some(component.into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    /// Creates a composite command running `commands` in order.
    pub fn composite<I, S>(id: impl Into<String>, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
            union: CommandUnion {
                composite: Some(CompositeCommand {
                    commands: commands.into_iter().map(Into::into).collect(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    /// Sets the component of an exec or apply command.
    ///
    /// Other variants are returned unchanged.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        if let Some(exec) = self.union.exec.as_mut() {
            exec.component = Some(component.into());
        } else if let Some(apply) = self.union.apply.as_mut() {
            apply.component = Some(component.into());
        }
        self
    }

    /// Sets the argument vector of an exec command.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(exec) = self.union.exec.as_mut() {
            exec.args = args.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Returns the component this command targets, if any.
    pub fn component(&self) -> Option<&str> {
        match self.union.variant()? {
            CommandVariant::Exec(exec) => exec.component.as_deref(),
            CommandVariant::Apply(apply) => apply.component.as_deref(),
            CommandVariant::Composite(_) | CommandVariant::Custom(_) => None,
        }
    }
}

impl UnionTree for Command {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.visit(&mut self.union)
    }
}

/// Revision and remote to check a git-like project out from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFrom {
    /// Branch, tag or commit to check out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Remote to check the revision out from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

/// Git or GitHub project source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitProjectSource {
    /// Revision and remote to check out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_from: Option<CheckoutFrom>,
    /// Remote name to URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remotes: BTreeMap<String, String>,
}

impl GitProjectSource {
    pub fn with_remote(name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut remotes = BTreeMap::new();
        remotes.insert(name.into(), url.into());
        Self {
            checkout_from: None,
            remotes,
        }
    }
}

/// Zip archive project source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipProjectSource {
    /// URL of the archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Implementation-defined project source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomProjectSource {
    /// Class interpreting the embedded resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_source_class: Option<String>,
    /// Opaque source definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_resource: Option<serde_json::Value>,
}

/// Discriminator of [`ProjectSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectSourceType {
    /// The `git` slot.
    Git,
    /// The `github` slot.
    Github,
    /// The `zip` slot.
    Zip,
    /// The `custom` slot.
    Custom,
}

/// Where a project's sources come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSource {
    /// Discriminator; set by normalization, stripped by simplification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<ProjectSourceType>,
    /// Git repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitProjectSource>,
    /// GitHub repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitProjectSource>,
    /// Zip archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<ZipProjectSource>,
    /// Implementation-defined source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomProjectSource>,
}

/// Borrowed view of the authoritative slot of a [`ProjectSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectSourceVariant<'a> {
    /// Git repository.
    Git(&'a GitProjectSource),
    /// GitHub repository.
    Github(&'a GitProjectSource),
    /// Zip archive.
    Zip(&'a ZipProjectSource),
    /// Custom source.
    Custom(&'a CustomProjectSource),
}

impl ProjectSource {
    pub fn git(source: GitProjectSource) -> Self {
        Self {
            git: Some(source),
            ..Default::default()
        }
    }

    pub fn zip(location: impl Into<String>) -> Self {
        Self {
            zip: Some(ZipProjectSource {
                location: Some(location.into()),
            }),
            ..Default::default()
        }
    }

    pub fn variant(&self) -> Option<ProjectSourceVariant<'_>> {
        Some(match self.active()? {
            ProjectSourceType::Git => ProjectSourceVariant::Git(self.git.as_ref()?),
            ProjectSourceType::Github => ProjectSourceVariant::Github(self.github.as_ref()?),
            ProjectSourceType::Zip => ProjectSourceVariant::Zip(self.zip.as_ref()?),
            ProjectSourceType::Custom => ProjectSourceVariant::Custom(self.custom.as_ref()?),
        })
    }
}

impl Union for ProjectSource {
    type Tag = ProjectSourceType;
    const UNION_TYPE: &'static str = "ProjectSource";

    fn discriminator(&self) -> Option<ProjectSourceType> {
        self.source_type
    }

    fn set_discriminator(&mut self, tag: Option<ProjectSourceType>) {
        self.source_type = tag;
    }

    fn populated(&self) -> Vec<ProjectSourceType> {
        let mut tags = Vec::new();
        if self.git.is_some() {
            tags.push(ProjectSourceType::Git);
        }
        if self.github.is_some() {
            tags.push(ProjectSourceType::Github);
        }
        if self.zip.is_some() {
            tags.push(ProjectSourceType::Zip);
        }
        if self.custom.is_some() {
            tags.push(ProjectSourceType::Custom);
        }
        tags
    }

    fn retain_only(&mut self, tag: ProjectSourceType) {
        if tag != ProjectSourceType::Git {
            self.git = None;
        }
        if tag != ProjectSourceType::Github {
            self.github = None;
        }
        if tag != ProjectSourceType::Zip {
            self.zip = None;
        }
        if tag != ProjectSourceType::Custom {
            self.custom = None;
        }
    }
}

impl UnionTree for ProjectSource {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.visit(self)
    }
}

/// Project worked on in the workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project name; its key when merging.
    #[serde(default)]
    pub name: String,
    /// Path the project is cloned to, relative to the projects root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_path: Option<String>,
    /// Directories to check out; replaced wholesale when overridden.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sparse_checkout_dirs: Vec<String>,
    /// Where the sources come from, flattened into the project.
    #[serde(flatten)]
    pub source: ProjectSource,
}

impl Project {
    pub fn new(name: impl Into<String>, source: ProjectSource) -> Self {
        Self {
            name: name.into(),
            clone_path: None,
            sparse_checkout_dirs: Vec::new(),
            source,
        }
    }
}

impl UnionTree for Project {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        self.source.walk_unions(walker)
    }
}

/// Project usable as a starting point when bootstrapping a new project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterProject {
    /// Starter project name; its key when merging.
    #[serde(default)]
    pub name: String,
    /// Short description shown to users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Subdirectory of the source to use as the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_dir: Option<String>,
    /// Where the sources come from, flattened into the starter project.
    #[serde(flatten)]
    pub source: ProjectSource,
}

impl StarterProject {
    pub fn new(name: impl Into<String>, source: ProjectSource) -> Self {
        Self {
            name: name.into(),
            description: None,
            sub_dir: None,
            source,
        }
    }
}

impl UnionTree for StarterProject {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        self.source.walk_unions(walker)
    }
}

/// Bindings of command ids to workspace lifecycle events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Events {
    /// Commands run before the workspace starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_start: Vec<String>,
    /// Commands run once the workspace has started.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_start: Vec<String>,
    /// Commands run before the workspace stops.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_stop: Vec<String>,
    /// Commands run after the workspace has stopped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_stop: Vec<String>,
}

impl Events {
    /// Returns each event name paired with its bound command ids.
    pub fn bindings(&self) -> [(&'static str, &[String]); 4] {
        [
            ("preStart", &self.pre_start),
            ("postStart", &self.post_start),
            ("preStop", &self.pre_stop),
            ("postStop", &self.post_stop),
        ]
    }
}

/// Core content of a workspace template: the document under composition.
///
/// # Examples
///
/// ```
/// use devtemplate_core::*;
///
/// let mut content = TemplateSpecContent::default();
/// content.components.push(Component::container("tools", "quay.io/tools:latest"));
/// content.commands.push(Command::exec("build", "make").with_component("tools"));
/// content.events = Some(Events {
///     post_start: vec!["build".into()],
///     ..Default::default()
/// });
///
/// assert!(validate_content(&content).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpecContent {
    /// Free-form template attributes, merged key-wise.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    /// Workspace components, keyed by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    /// Projects, keyed by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    /// Starter projects, keyed by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starter_projects: Vec<StarterProject>,
    /// Commands, keyed by id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
    /// Lifecycle event bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Events>,
}

impl TemplateSpecContent {
    /// Looks up a command by id.
    pub fn find_command(&self, id: &str) -> Option<&Command> {
        self.commands.iter().find(|command| command.id == id)
    }

    /// Looks up a project by name.
    pub fn find_project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.name == name)
    }
}

impl UnionTree for TemplateSpecContent {
    fn walk_unions(&mut self, walker: &mut UnionWalker) -> Result<(), UnionError> {
        walker.list("components", &mut self.components)?;
        walker.list("projects", &mut self.projects)?;
        walker.list("starterProjects", &mut self.starter_projects)?;
        walker.list("commands", &mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{from_document, normalize, to_document};

    #[test]
    fn test_command_flattens_union_slots() {
        let command = Command::exec("run", "./start.sh");
        let doc = to_document(&command).unwrap();
        assert_eq!(
            doc,
            json!({"id": "run", "exec": {"commandLine": "./start.sh"}})
        );
    }

    #[test]
    fn test_command_discriminator_round_trips() {
        let mut command = Command::apply("deploy", "k8s");
        normalize(&mut command).unwrap();
        let doc = to_document(&command).unwrap();
        assert_eq!(doc["commandType"], "Apply");

        let back: Command = from_document(doc).unwrap();
        assert_eq!(back.union.command_type, Some(CommandType::Apply));
    }

    #[test]
    fn test_variant_follows_discriminator() {
        let union = CommandUnion {
            command_type: Some(CommandType::Composite),
            exec: Some(ExecCommand::default()),
            composite: Some(CompositeCommand::default()),
            ..Default::default()
        };
        assert!(matches!(union.variant(), Some(CommandVariant::Composite(_))));
    }

    #[test]
    fn test_variant_is_none_for_ambiguous_union() {
        let union = CommandUnion {
            exec: Some(ExecCommand::default()),
            apply: Some(ApplyCommand::default()),
            ..Default::default()
        };
        assert!(union.variant().is_none());
    }

    #[test]
    fn test_project_source_flattens_into_project() {
        let project = Project::new(
            "api",
            ProjectSource::git(GitProjectSource::with_remote(
                "origin",
                "https://example.com/api.git",
            )),
        );
        let doc = to_document(&project).unwrap();
        assert_eq!(
            doc,
            json!({
                "name": "api",
                "git": {"remotes": {"origin": "https://example.com/api.git"}}
            })
        );
    }

    #[test]
    fn test_command_component_lookup() {
        let exec = Command::exec("build", "make").with_component("tools");
        assert_eq!(exec.component(), Some("tools"));
        let composite = Command::composite("all", ["build", "test"]);
        assert_eq!(composite.component(), None);
    }
}
