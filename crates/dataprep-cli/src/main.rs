// crates/dataprep-cli/src/main.rs
// ============================================================================
// Module: Dataprep CLI Entry Point
// Description: Command dispatcher for content-server fixture preparation.
// Purpose: Expose the fixture services to shell scripts and CI jobs.
// Dependencies: clap, dataprep-config, dataprep-core, dataprep-services, mime_guess, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `dataprep` binary creates and removes test fixtures on a content
//! server: sites, users, folders, documents, social metadata, workflow tasks,
//! and dashboards. Server coordinates and the fallback administrator come
//! from `dataprep.toml`; `--user`/`--password` act on behalf of another
//! account. Soft outcomes (already exists, not found) are printed and exit
//! successfully; every error exits with status 1.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use dataprep_config::DataPrepConfig;
use dataprep_core::Credentials;
use dataprep_core::DataPrepError;
use dataprep_core::HttpClient;
use dataprep_core::NodeRef;
use dataprep_core::SiteId;
use dataprep_services::DashboardLayout;
use dataprep_services::DataPrep;
use dataprep_services::Dashlet;
use dataprep_services::NewDocument;
use dataprep_services::NewSite;
use dataprep_services::NewTask;
use dataprep_services::NewUser;
use dataprep_services::SiteRole;
use dataprep_services::SiteVisibility;
use dataprep_services::TaskPriority;
use dataprep_services::parse_due_date;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a file uploaded from disk.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;
/// Log filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "dataprep", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to dataprep.toml or `DATAPREP_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Account to act as (defaults to the configured administrator).
    #[arg(long, value_name = "USER", global = true)]
    user: Option<String>,
    /// Password for `--user`.
    #[arg(long, value_name = "PASSWORD", global = true)]
    password: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Site fixtures.
    Site {
        /// Selected site subcommand.
        #[command(subcommand)]
        command: SiteCommand,
    },
    /// User fixtures.
    User {
        /// Selected user subcommand.
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Folder and document fixtures.
    Content {
        /// Selected content subcommand.
        #[command(subcommand)]
        command: ContentCommand,
    },
    /// Tags on a node.
    Tag {
        /// Selected tag subcommand.
        #[command(subcommand)]
        command: TagCommand,
    },
    /// Comments on a node.
    Comment {
        /// Selected comment subcommand.
        #[command(subcommand)]
        command: CommentCommand,
    },
    /// Likes on a node.
    Like {
        /// Selected like subcommand.
        #[command(subcommand)]
        command: LikeCommand,
    },
    /// Workflow task fixtures.
    Workflow {
        /// Selected workflow subcommand.
        #[command(subcommand)]
        command: WorkflowCommand,
    },
    /// Dashboard layouts.
    Dashboard {
        /// Selected dashboard subcommand.
        #[command(subcommand)]
        command: DashboardCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Site subcommands.
#[derive(Subcommand, Debug)]
enum SiteCommand {
    /// Create a site.
    Create(SiteCreateCommand),
    /// Print whether a site exists.
    Exists(SiteArgs),
    /// Delete a site permanently.
    Delete(SiteArgs),
    /// Add a user to a site.
    AddMember(SiteMemberCommand),
}

/// Arguments naming a site.
#[derive(Args, Debug)]
struct SiteArgs {
    /// Site short name.
    #[arg(value_name = "SITE")]
    site: String,
}

/// Arguments for site creation.
#[derive(Args, Debug)]
struct SiteCreateCommand {
    /// Site short name.
    #[arg(value_name = "SITE")]
    site: String,
    /// Display title (defaults to the short name).
    #[arg(long)]
    title: Option<String>,
    /// Site description.
    #[arg(long)]
    description: Option<String>,
    /// Site visibility.
    #[arg(long, value_enum, default_value_t = VisibilityArg::Public)]
    visibility: VisibilityArg,
}

/// Arguments for adding a site member.
#[derive(Args, Debug)]
struct SiteMemberCommand {
    /// Site short name.
    #[arg(value_name = "SITE")]
    site: String,
    /// User to add.
    #[arg(value_name = "USER_ID")]
    member: String,
    /// Role granted to the user.
    #[arg(long, value_enum, default_value_t = RoleArg::Consumer)]
    role: RoleArg,
}

/// Site visibility values.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum VisibilityArg {
    /// Public site.
    Public,
    /// Moderated site.
    Moderated,
    /// Private site.
    Private,
}

impl From<VisibilityArg> for SiteVisibility {
    fn from(value: VisibilityArg) -> Self {
        match value {
            VisibilityArg::Public => Self::Public,
            VisibilityArg::Moderated => Self::Moderated,
            VisibilityArg::Private => Self::Private,
        }
    }
}

/// Site role values.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RoleArg {
    /// Read-only access.
    Consumer,
    /// May add content.
    Contributor,
    /// May edit content.
    Collaborator,
    /// Full control.
    Manager,
}

impl From<RoleArg> for SiteRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Consumer => Self::SiteConsumer,
            RoleArg::Contributor => Self::SiteContributor,
            RoleArg::Collaborator => Self::SiteCollaborator,
            RoleArg::Manager => Self::SiteManager,
        }
    }
}

/// User subcommands.
#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user.
    Create(UserCreateCommand),
    /// Print whether a user exists.
    Exists(UserArgs),
    /// Delete a user.
    Delete(UserArgs),
}

/// Arguments naming a user.
#[derive(Args, Debug)]
struct UserArgs {
    /// User id.
    #[arg(value_name = "USER_ID")]
    id: String,
}

/// Arguments for user creation.
#[derive(Args, Debug)]
struct UserCreateCommand {
    /// User id.
    #[arg(value_name = "USER_ID")]
    id: String,
    /// Initial password.
    #[arg(long = "new-password", value_name = "PASSWORD")]
    new_password: String,
}

/// Content subcommands.
#[derive(Subcommand, Debug)]
enum ContentCommand {
    /// Create a folder in a site library.
    Folder(ContentFolderCommand),
    /// Create a folder under a repository path.
    RepoFolder(RepositoryFolderCommand),
    /// Upload a file into a site library.
    Upload(ContentUploadCommand),
    /// Print the node reference of named content (empty when absent).
    NodeRef(ContentLookupCommand),
    /// Delete named content from a site library.
    Delete(ContentDeleteCommand),
}

/// Arguments for site folder creation.
#[derive(Args, Debug)]
struct ContentFolderCommand {
    /// Site short name.
    #[arg(long, value_name = "SITE")]
    site: String,
    /// Folder name.
    #[arg(value_name = "NAME")]
    name: String,
    /// Parent folder name (defaults to the library root).
    #[arg(long, value_name = "FOLDER")]
    parent: Option<String>,
}

/// Arguments for repository folder creation.
#[derive(Args, Debug)]
struct RepositoryFolderCommand {
    /// Repository path of the parent folder.
    #[arg(long, value_name = "PATH")]
    path: String,
    /// Folder name.
    #[arg(value_name = "NAME")]
    name: String,
}

/// Arguments for document upload.
#[derive(Args, Debug)]
struct ContentUploadCommand {
    /// Site short name.
    #[arg(long, value_name = "SITE")]
    site: String,
    /// File to upload.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Document name (defaults to the file name).
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
    /// MIME type (guessed from the extension when omitted).
    #[arg(long, value_name = "TYPE")]
    mime_type: Option<String>,
    /// Parent folder name (defaults to the library root).
    #[arg(long, value_name = "FOLDER")]
    parent: Option<String>,
}

/// Arguments for node reference lookup.
#[derive(Args, Debug)]
struct ContentLookupCommand {
    /// Site whose library is searched.
    #[arg(long, value_name = "SITE", conflicts_with = "path", required_unless_present = "path")]
    site: Option<String>,
    /// Repository folder path that is searched.
    #[arg(long, value_name = "PATH")]
    path: Option<String>,
    /// Content name.
    #[arg(value_name = "NAME")]
    name: String,
}

/// Arguments for content deletion.
#[derive(Args, Debug)]
struct ContentDeleteCommand {
    /// Site short name.
    #[arg(long, value_name = "SITE")]
    site: String,
    /// Content name.
    #[arg(value_name = "NAME")]
    name: String,
}

/// Node targeted by social commands.
#[derive(Args, Debug)]
struct NodeTargetArgs {
    /// Node reference (full CMIS object ids are accepted).
    #[arg(long, value_name = "NODE_REF", conflicts_with_all = ["site", "name"], required_unless_present = "name")]
    node: Option<String>,
    /// Site holding the named content.
    #[arg(long, value_name = "SITE", requires = "name")]
    site: Option<String>,
    /// Content name resolved inside the site.
    #[arg(long, value_name = "NAME", requires = "site")]
    name: Option<String>,
}

/// Tag subcommands.
#[derive(Subcommand, Debug)]
enum TagCommand {
    /// Add a tag.
    Add(NodeTextCommand),
    /// List tags.
    List(NodeCommand),
    /// Remove a tag (case-insensitive).
    Remove(NodeTextCommand),
}

/// Comment subcommands.
#[derive(Subcommand, Debug)]
enum CommentCommand {
    /// Add a comment.
    Add(NodeTextCommand),
    /// List comments.
    List(NodeCommand),
    /// Remove the comment with exactly this text.
    Remove(NodeTextCommand),
}

/// Like subcommands.
#[derive(Subcommand, Debug)]
enum LikeCommand {
    /// Like a node as the calling user.
    Add(NodeCommand),
    /// Print the number of likes.
    Count(NodeCommand),
    /// Withdraw the calling user's like.
    Remove(NodeCommand),
}

/// Arguments naming a node.
#[derive(Args, Debug)]
struct NodeCommand {
    /// Target node.
    #[command(flatten)]
    target: NodeTargetArgs,
}

/// Arguments naming a node and a text value.
#[derive(Args, Debug)]
struct NodeTextCommand {
    /// Target node.
    #[command(flatten)]
    target: NodeTargetArgs,
    /// Tag or comment text.
    #[arg(value_name = "TEXT")]
    text: String,
}

/// Workflow subcommands.
#[derive(Subcommand, Debug)]
enum WorkflowCommand {
    /// Start an ad-hoc task and print the process id.
    Start(WorkflowStartCommand),
    /// Delete a process.
    Delete(WorkflowDeleteCommand),
}

/// Arguments for starting a task.
#[derive(Args, Debug)]
struct WorkflowStartCommand {
    /// Assignee user id.
    #[arg(long, value_name = "USER_ID")]
    assignee: String,
    /// Task description.
    #[arg(long)]
    message: String,
    /// Due date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    due: String,
    /// Task priority.
    #[arg(long, value_enum, default_value_t = PriorityArg::Medium)]
    priority: PriorityArg,
    /// Notify the assignee by email.
    #[arg(long)]
    send_email: bool,
    /// Node reference attached to the task (repeatable).
    #[arg(long = "item", value_name = "NODE_REF")]
    items: Vec<String>,
}

/// Arguments for deleting a process.
#[derive(Args, Debug)]
struct WorkflowDeleteCommand {
    /// Process id.
    #[arg(value_name = "PROCESS_ID")]
    process_id: String,
}

/// Task priority values.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PriorityArg {
    /// Priority 1.
    High,
    /// Priority 2.
    Medium,
    /// Priority 3.
    Low,
}

impl From<PriorityArg> for TaskPriority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::High => Self::High,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::Low => Self::Low,
        }
    }
}

/// Dashboard subcommands.
#[derive(Subcommand, Debug)]
enum DashboardCommand {
    /// Customize a site dashboard.
    Site(DashboardSiteCommand),
    /// Customize the calling user's dashboard.
    User(DashboardArgs),
}

/// Arguments for site dashboard customization.
#[derive(Args, Debug)]
struct DashboardSiteCommand {
    /// Site short name.
    #[arg(value_name = "SITE")]
    site: String,
    /// Layout and dashlets.
    #[command(flatten)]
    dashboard: DashboardArgs,
}

/// Layout and dashlet arguments.
#[derive(Args, Debug)]
struct DashboardArgs {
    /// Column layout.
    #[arg(long, value_enum, default_value_t = LayoutArg::TwoColumnsWideRight)]
    layout: LayoutArg,
    /// Dashlet placement (repeatable).
    #[arg(long = "dashlet", value_name = "COLUMN:POSITION:URL", value_parser = parse_dashlet)]
    dashlets: Vec<Dashlet>,
}

/// Dashboard layout values.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LayoutArg {
    /// One column.
    OneColumn,
    /// Two columns, wide right.
    TwoColumnsWideRight,
    /// Two columns, wide left.
    TwoColumnsWideLeft,
    /// Three columns.
    ThreeColumns,
    /// Four columns.
    FourColumns,
}

impl From<LayoutArg> for DashboardLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::OneColumn => Self::OneColumn,
            LayoutArg::TwoColumnsWideRight => Self::TwoColumnsWideRight,
            LayoutArg::TwoColumnsWideLeft => Self::TwoColumnsWideLeft,
            LayoutArg::ThreeColumns => Self::ThreeColumns,
            LayoutArg::FourColumns => Self::FourColumns,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<DataPrepError> for CliError {
    fn from(error: DataPrepError) -> Self {
        Self::new(error.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Installs the stderr log subscriber.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    let Cli {
        config,
        user,
        password,
        command,
    } = cli;
    let context = || Context::build(config.as_deref(), user.as_deref(), password.as_deref());
    match command {
        Commands::Site {
            command,
        } => command_site(&context()?, command),
        Commands::User {
            command,
        } => command_user(&context()?, command),
        Commands::Content {
            command,
        } => command_content(&context()?, command),
        Commands::Tag {
            command,
        } => command_tag(&context()?, command),
        Commands::Comment {
            command,
        } => command_comment(&context()?, command),
        Commands::Like {
            command,
        } => command_like(&context()?, command),
        Commands::Workflow {
            command,
        } => command_workflow(&context()?, command),
        Commands::Dashboard {
            command,
        } => command_dashboard(&context()?, command),
        Commands::Config {
            command,
        } => command_config(&command, config.as_deref()),
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Services and credentials shared by every fixture command.
struct Context {
    /// Fixture services bound to the configured server.
    dataprep: DataPrep,
    /// Account the command acts as.
    credentials: Credentials,
}

impl Context {
    /// Loads configuration and builds the HTTP client.
    fn build(
        config_path: Option<&Path>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> CliResult<Self> {
        let config = DataPrepConfig::load_or_default(config_path)
            .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
        let credentials = resolve_credentials(user, password, &config)?;
        let client = HttpClient::new(config.server_address(), config.http_options())?;
        debug!(
            server = %client.base_url(),
            binding = config.binding().as_str(),
            user = credentials.username(),
            "cli context ready"
        );
        Ok(Self {
            dataprep: DataPrep::new(client, config.binding()),
            credentials,
        })
    }

    /// Resolves a social command target to a node reference.
    fn node(&self, target: &NodeTargetArgs) -> CliResult<NodeRef> {
        if let Some(node) = &target.node {
            return Ok(NodeRef::from_object_id(node));
        }
        let (Some(site), Some(name)) = (&target.site, &target.name) else {
            return Err(CliError::new("either --node or --site with --name is required".to_string()));
        };
        self.dataprep
            .content()
            .find_node(&self.credentials, &SiteId::new(site.as_str()), name)?
            .ok_or_else(|| CliError::new(format!("no content named {name} in site {site}")))
    }
}

/// Chooses explicit credentials or the configured administrator.
fn resolve_credentials(
    user: Option<&str>,
    password: Option<&str>,
    config: &DataPrepConfig,
) -> CliResult<Credentials> {
    match (user, password) {
        (None, None) => Ok(config.admin_credentials()),
        (Some(user), Some(password)) => Ok(Credentials::new(user, password)),
        (Some(_), None) => Err(CliError::new("--password is required with --user".to_string())),
        (None, Some(_)) => Err(CliError::new("--user is required with --password".to_string())),
    }
}

// ============================================================================
// SECTION: Site and User Commands
// ============================================================================

/// Dispatches site subcommands.
fn command_site(context: &Context, command: SiteCommand) -> CliResult<ExitCode> {
    let sites = context.dataprep.sites();
    let credentials = &context.credentials;
    match command {
        SiteCommand::Create(command) => {
            let mut site = NewSite::new(SiteId::new(command.site)).visibility(command.visibility.into());
            if let Some(title) = command.title {
                site = site.title(title);
            }
            if let Some(description) = command.description {
                site = site.description(description);
            }
            let created = sites.create_site(credentials, &site)?;
            report(created, "site created", "site already exists")
        }
        SiteCommand::Exists(args) => {
            write_value(&sites.site_exists(credentials, &SiteId::new(args.site))?.to_string())
        }
        SiteCommand::Delete(args) => {
            let deleted = sites.delete_site(credentials, &SiteId::new(args.site))?;
            report(deleted, "site deleted", "site not found")
        }
        SiteCommand::AddMember(command) => {
            let added = sites.add_member(
                credentials,
                &SiteId::new(command.site),
                &command.member,
                command.role.into(),
            )?;
            report(added, "member added", "member already present")
        }
    }
}

/// Dispatches user subcommands.
fn command_user(context: &Context, command: UserCommand) -> CliResult<ExitCode> {
    let people = context.dataprep.people();
    let credentials = &context.credentials;
    match command {
        UserCommand::Create(command) => {
            let created =
                people.create_user(credentials, &NewUser::new(command.id, command.new_password))?;
            report(created, "user created", "user already exists")
        }
        UserCommand::Exists(args) => {
            write_value(&people.user_exists(credentials, &args.id)?.to_string())
        }
        UserCommand::Delete(args) => {
            let deleted = people.delete_user(credentials, &args.id)?;
            report(deleted, "user deleted", "user not found")
        }
    }
}

// ============================================================================
// SECTION: Content Commands
// ============================================================================

/// Dispatches content subcommands.
fn command_content(context: &Context, command: ContentCommand) -> CliResult<ExitCode> {
    let content = context.dataprep.content();
    let credentials = &context.credentials;
    match command {
        ContentCommand::Folder(command) => {
            let node = content.create_folder(
                credentials,
                &SiteId::new(command.site),
                &command.name,
                command.parent.as_deref(),
            )?;
            write_value(node.as_str())
        }
        ContentCommand::RepoFolder(command) => {
            let node = content.create_repository_folder(credentials, &command.path, &command.name)?;
            write_value(node.as_str())
        }
        ContentCommand::Upload(command) => {
            let document = read_document(&command)?;
            let node = content.upload_document(
                credentials,
                &SiteId::new(command.site),
                document,
                command.parent.as_deref(),
            )?;
            write_value(node.as_str())
        }
        ContentCommand::NodeRef(command) => {
            let node = match (&command.site, &command.path) {
                (Some(site), _) => {
                    content.node_ref(credentials, &SiteId::new(site.as_str()), &command.name)?
                }
                (None, Some(path)) => content.node_ref_in_path(credentials, path, &command.name)?,
                (None, None) => {
                    return Err(CliError::new("either --site or --path is required".to_string()));
                }
            };
            write_value(&node)
        }
        ContentCommand::Delete(command) => {
            let deleted =
                content.delete_content(credentials, &SiteId::new(command.site), &command.name)?;
            report(deleted, "content deleted", "content not found")
        }
    }
}

/// Builds an upload request from a file on disk.
fn read_document(command: &ContentUploadCommand) -> CliResult<NewDocument> {
    let content = read_bytes_with_limit(&command.file, MAX_UPLOAD_BYTES).map_err(|err| match err {
        ReadLimitError::Io(error) => {
            CliError::new(format!("failed to read {}: {error}", command.file.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{} is too large to upload ({size} bytes > {limit} bytes)",
            command.file.display()
        )),
    })?;
    let name = match &command.name {
        Some(name) => name.clone(),
        None => command
            .file
            .file_name()
            .and_then(OsStr::to_str)
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::new(format!("cannot derive a document name from {}", command.file.display()))
            })?,
    };
    let mime_type =
        command.mime_type.clone().unwrap_or_else(|| guess_mime_type(&command.file));
    Ok(NewDocument {
        name,
        mime_type,
        content,
    })
}

/// Guesses a MIME type from a file extension, falling back to octet-stream.
fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

// ============================================================================
// SECTION: Social Commands
// ============================================================================

/// Dispatches tag subcommands.
fn command_tag(context: &Context, command: TagCommand) -> CliResult<ExitCode> {
    let social = context.dataprep.social();
    let credentials = &context.credentials;
    match command {
        TagCommand::Add(command) => {
            let node = context.node(&command.target)?;
            let added = social.add_tag(credentials, &node, &command.text)?;
            report(added, "tag added", "node not found")
        }
        TagCommand::List(command) => {
            let node = context.node(&command.target)?;
            for tag in social.tags(credentials, &node)? {
                write_value(&tag.tag)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        TagCommand::Remove(command) => {
            let node = context.node(&command.target)?;
            let removed = social.remove_tag(credentials, &node, &command.text)?;
            report(removed, "tag removed", "tag not found")
        }
    }
}

/// Dispatches comment subcommands.
fn command_comment(context: &Context, command: CommentCommand) -> CliResult<ExitCode> {
    let social = context.dataprep.social();
    let credentials = &context.credentials;
    match command {
        CommentCommand::Add(command) => {
            let node = context.node(&command.target)?;
            let added = social.add_comment(credentials, &node, &command.text)?;
            report(added, "comment added", "node not found")
        }
        CommentCommand::List(command) => {
            let node = context.node(&command.target)?;
            for comment in social.comments(credentials, &node)? {
                write_value(&comment.content)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        CommentCommand::Remove(command) => {
            let node = context.node(&command.target)?;
            let removed = social.remove_comment(credentials, &node, &command.text)?;
            report(removed, "comment removed", "comment not found")
        }
    }
}

/// Dispatches like subcommands.
fn command_like(context: &Context, command: LikeCommand) -> CliResult<ExitCode> {
    let social = context.dataprep.social();
    let credentials = &context.credentials;
    match command {
        LikeCommand::Add(command) => {
            let node = context.node(&command.target)?;
            report(social.like(credentials, &node)?, "like added", "node not found")
        }
        LikeCommand::Count(command) => {
            let node = context.node(&command.target)?;
            write_value(&social.like_count(credentials, &node)?.to_string())
        }
        LikeCommand::Remove(command) => {
            let node = context.node(&command.target)?;
            report(social.unlike(credentials, &node)?, "like removed", "like not found")
        }
    }
}

// ============================================================================
// SECTION: Workflow and Dashboard Commands
// ============================================================================

/// Dispatches workflow subcommands.
fn command_workflow(context: &Context, command: WorkflowCommand) -> CliResult<ExitCode> {
    let workflow = context.dataprep.workflow();
    let credentials = &context.credentials;
    match command {
        WorkflowCommand::Start(command) => {
            let task = NewTask {
                assignee: command.assignee,
                message: command.message,
                due_date: parse_due_date(&command.due)?,
                priority: command.priority.into(),
                send_email: command.send_email,
                items: command.items.iter().map(|item| NodeRef::from_object_id(item)).collect(),
            };
            write_value(&workflow.start_task(credentials, &task)?)
        }
        WorkflowCommand::Delete(command) => {
            let deleted = workflow.delete_process(credentials, &command.process_id)?;
            report(deleted, "process deleted", "process not found")
        }
    }
}

/// Dispatches dashboard subcommands.
fn command_dashboard(context: &Context, command: DashboardCommand) -> CliResult<ExitCode> {
    let dashboard = context.dataprep.dashboard();
    let credentials = &context.credentials;
    let applied = match command {
        DashboardCommand::Site(command) => dashboard.customize_site_dashboard(
            credentials,
            &SiteId::new(command.site),
            command.dashboard.layout.into(),
            &command.dashboard.dashlets,
        )?,
        DashboardCommand::User(args) => dashboard.customize_user_dashboard(
            credentials,
            args.layout.into(),
            &args.dashlets,
        )?,
    };
    report(applied, "dashboard customized", "dashboard customization was not applied")
}

/// Parses a `COLUMN:POSITION:URL` dashlet placement.
fn parse_dashlet(value: &str) -> Result<Dashlet, String> {
    let mut parts = value.splitn(3, ':');
    let (Some(column), Some(position), Some(url)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected COLUMN:POSITION:URL, got {value}"));
    };
    let column: u8 =
        column.trim().parse().map_err(|_| format!("invalid dashlet column: {column}"))?;
    let position: u8 =
        position.trim().parse().map_err(|_| format!("invalid dashlet position: {position}"))?;
    let url = url.trim();
    if url.is_empty() {
        return Err("dashlet url must not be empty".to_string());
    }
    Ok(Dashlet::new(url, column, position))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand, path: Option<&Path>) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => command_config_validate(path),
    }
}

/// Executes the config validation command.
fn command_config_validate(path: Option<&Path>) -> CliResult<ExitCode> {
    let config = DataPrepConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let address = config.server_address();
    write_stdout_line(&format!(
        "config ok: {}://{}:{} ({} binding)",
        address.scheme.as_str(),
        address.host,
        address.port,
        config.binding().as_str()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints a soft outcome and exits successfully either way.
fn report(applied: bool, done: &str, skipped: &str) -> CliResult<ExitCode> {
    write_value(if applied { done } else { skipped })
}

/// Prints a single value line.
fn write_value(value: &str) -> CliResult<ExitCode> {
    write_stdout_line(value).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
