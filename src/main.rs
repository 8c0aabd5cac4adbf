//! Tiller CLI - a backlog manager for products, features, epics, stories, and tasks.

use clap::{CommandFactory, Parser};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use tiller::action_log;
use tiller::cli::{
    BoardCommands, Cli, Commands, EpicCommands, FeatureCommands, ProductCommands, SprintCommands,
    StoryCommands, SystemCommands, TaskCommands, UserCommands,
};
use tiller::commands::{self, output, Report};
use tiller::engine::Engine;
use tiller::models::NodeKind;
use tiller::store;

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let human = cli.human_readable;

    // Determine workspace: --workspace flag > TL_WORKSPACE env > cwd
    let workspace = resolve_workspace(cli.workspace, human);

    // Serialize command for logging
    let (cmd_name, args_json) = describe_command(&cli.command);

    // Start timing
    let start = Instant::now();

    // Execute command
    let result = run_command(cli.command, &workspace, human);

    // Calculate duration
    let duration = start.elapsed().as_millis() as u64;

    // Determine success/error
    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    // Log the action (never fails the command)
    action_log::log_action(&workspace, &cmd_name, args_json, success, error, duration);

    // Handle result
    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the workspace path. An explicit path must exist and is used
/// literally; otherwise the current directory is the workspace.
fn resolve_workspace(explicit: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit {
        Some(path) => {
            if !path.exists() {
                if human {
                    eprintln!("Error: Specified workspace does not exist: {}", path.display());
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!("Specified workspace does not exist: {}", path.display())
                        })
                    );
                }
                process::exit(1);
            }
            path
        }
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// A loggable name plus argv for the action log.
fn describe_command(command: &Option<Commands>) -> (String, serde_json::Value) {
    let name = match command {
        None => "help".to_string(),
        Some(Commands::Product { command }) => format!("product {}", variant_word(command)),
        Some(Commands::Feature { command }) => format!("feature {}", variant_word(command)),
        Some(Commands::Epic { command }) => format!("epic {}", variant_word(command)),
        Some(Commands::Story { command }) => format!("story {}", variant_word(command)),
        Some(Commands::Task { command }) => format!("task {}", variant_word(command)),
        Some(Commands::User { command }) => format!("user {}", variant_word(command)),
        Some(Commands::Sprint { command }) => format!("sprint {}", variant_word(command)),
        Some(Commands::Select { .. }) => "select".to_string(),
        Some(Commands::View { .. }) => "view".to_string(),
        Some(Commands::Tree { .. }) => "tree".to_string(),
        Some(Commands::Board { command, .. }) => match command {
            Some(c) => format!("board {}", variant_word(c)),
            None => "board".to_string(),
        },
        Some(Commands::Show { .. }) => "show".to_string(),
        Some(Commands::System { command }) => format!("system {}", variant_word(command)),
    };
    let argv: Vec<String> = env::args().skip(1).collect();
    (name, serde_json::json!({ "argv": argv }))
}

/// First word of a Debug-formatted subcommand, kebab-cased
/// ("SetCurrent { .. }" -> "set-current").
fn variant_word<T: std::fmt::Debug>(command: &T) -> String {
    let debug = format!("{:?}", command);
    let word = debug.split([' ', '{']).next().unwrap_or("unknown");
    let mut out = String::new();
    for (i, c) in word.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn run_command(command: Option<Commands>, workspace: &Path, human: bool) -> tiller::Result<()> {
    let Some(command) = command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Init does not need a loaded engine
    if let Commands::System {
        command: SystemCommands::Init,
    } = &command
    {
        let report = commands::system_init(workspace)?;
        output(&report, human);
        return Ok(());
    }

    let mut engine = match store::open_default_store(workspace) {
        Ok(store) => Engine::load(store),
        Err(e) => {
            tracing::warn!(error = %e, "could not open store; using in-memory sample data");
            let mut engine = Engine::in_memory();
            engine.install_sample_data();
            engine
        }
    };

    let report = dispatch_command(&mut engine, command)?;
    engine.save_ui_state();
    output(&report, human);
    Ok(())
}

fn dispatch_command(engine: &mut Engine, command: Commands) -> tiller::Result<Report> {
    match command {
        Commands::Product { command } => match command {
            ProductCommands::Create {
                name,
                description,
                version,
            } => commands::create_product(engine, name, description, version),
            ProductCommands::List => commands::list_products(engine),
            ProductCommands::Show { id } => commands::show(engine, &id),
            ProductCommands::Update {
                id,
                name,
                description,
                version,
            } => commands::update_product(engine, id, name, description, version),
            ProductCommands::Delete { id } => {
                commands::delete_node(engine, NodeKind::Product, id)
            }
            ProductCommands::Reorder { id, before } => {
                commands::reorder_node(engine, NodeKind::Product, id, before)
            }
        },

        Commands::Feature { command } => match command {
            FeatureCommands::Create {
                name,
                product,
                description,
                priority,
                assignee,
            } => commands::create_feature(engine, name, product, description, priority, assignee),
            FeatureCommands::List { product } => commands::list_features(engine, product),
            FeatureCommands::Show { id } => commands::show(engine, &id),
            FeatureCommands::Update {
                id,
                name,
                description,
                priority,
                assignee,
                unassign,
            } => commands::update_feature(engine, id, name, description, priority, assignee, unassign),
            FeatureCommands::Delete { id } => {
                commands::delete_node(engine, NodeKind::Feature, id)
            }
            FeatureCommands::Reorder { id, before } => {
                commands::reorder_node(engine, NodeKind::Feature, id, before)
            }
        },

        Commands::Epic { command } => match command {
            EpicCommands::Create {
                title,
                feature,
                description,
                priority,
                assignee,
            } => commands::create_epic(engine, title, feature, description, priority, assignee),
            EpicCommands::List { feature } => commands::list_epics(engine, feature),
            EpicCommands::Show { id } => commands::show(engine, &id),
            EpicCommands::Update {
                id,
                title,
                description,
                status,
                priority,
                assignee,
                unassign,
            } => commands::update_epic(
                engine, id, title, description, status, priority, assignee, unassign,
            ),
            EpicCommands::Delete { id } => commands::delete_node(engine, NodeKind::Epic, id),
            EpicCommands::Reorder { id, before } => {
                commands::reorder_node(engine, NodeKind::Epic, id, before)
            }
        },

        Commands::Story { command } => match command {
            StoryCommands::Create {
                title,
                epic,
                description,
                priority,
                points,
                criteria,
                assignee,
            } => commands::create_story(
                engine, title, epic, description, priority, points, criteria, assignee,
            ),
            StoryCommands::List { epic } => commands::list_stories(engine, epic),
            StoryCommands::Show { id } => commands::show(engine, &id),
            StoryCommands::Update {
                id,
                title,
                description,
                status,
                priority,
                points,
                criteria,
                assignee,
                unassign,
            } => commands::update_story(
                engine, id, title, description, status, priority, points, criteria, assignee,
                unassign,
            ),
            StoryCommands::Delete { id } => {
                commands::delete_node(engine, NodeKind::UserStory, id)
            }
            StoryCommands::Reorder { id, before } => {
                commands::reorder_node(engine, NodeKind::UserStory, id, before)
            }
        },

        Commands::Task { command } => match command {
            TaskCommands::Create {
                title,
                story,
                description,
                priority,
                hours,
                assignee,
            } => commands::create_task(engine, title, story, description, priority, hours, assignee),
            TaskCommands::List { story } => commands::list_tasks(engine, story),
            TaskCommands::Show { id } => commands::show(engine, &id),
            TaskCommands::Update {
                id,
                title,
                description,
                status,
                priority,
                hours,
                assignee,
                unassign,
            } => commands::update_task(
                engine, id, title, description, status, priority, hours, assignee, unassign,
            ),
            TaskCommands::Delete { id } => commands::delete_node(engine, NodeKind::Task, id),
            TaskCommands::Reorder { id, before } => {
                commands::reorder_node(engine, NodeKind::Task, id, before)
            }
        },

        Commands::User { command } => match command {
            UserCommands::Create {
                name,
                email,
                role,
                avatar,
            } => commands::create_user(engine, name, email, role, avatar),
            UserCommands::List => commands::list_users(engine),
            UserCommands::Update {
                id,
                name,
                email,
                role,
                avatar,
            } => commands::update_user(engine, id, name, email, role, avatar),
            UserCommands::Delete { id } => commands::delete_user(engine, id),
        },

        Commands::Sprint { command } => match command {
            SprintCommands::Create {
                name,
                start,
                end,
                status,
            } => commands::create_sprint(engine, name, start, end, status),
            SprintCommands::List => commands::list_sprints(engine),
            SprintCommands::SetCurrent { id } => commands::set_current_sprint(engine, id),
            SprintCommands::Assign {
                item_id,
                sprint_id,
                none,
            } => commands::assign_to_sprint(engine, item_id, sprint_id, none),
        },

        Commands::Select { level, id, none } => commands::select(engine, &level, id, none),

        Commands::View { mode } => commands::set_view(engine, &mode),

        Commands::Tree { all } => commands::tree(engine, all),

        Commands::Board { all, command } => match command {
            Some(BoardCommands::Move { id, column }) => {
                commands::board_move(engine, id, &column)
            }
            None => commands::board(engine, all),
        },

        Commands::Show { id } => commands::show(engine, &id),

        Commands::System { command } => match command {
            SystemCommands::Init => unreachable!("handled before engine load"),
            SystemCommands::Seed => commands::system_seed(engine),
            SystemCommands::Info => commands::system_info(engine),
        },
    }
}
