use clap::Parser;
use cityscape::{
    Config, Profile, Store,
    cli::{self, Cli, Commands},
};
use color_eyre::Result;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    // Load configuration with the determined profile
    // Note: --config option is parsed but not yet used to override config path
    let config = Config::load_with_profile(profile)?;

    // Open the record store
    let db_path = config.get_database_path();
    let store = Store::open(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::AddEvent {
            title,
            description,
            location,
            date,
            time,
            category,
            photo,
        } => {
            cli::handle_add_event(title, description, location, date, time, category, photo, &store)?;
        }
        Commands::AddReport {
            title,
            description,
            category,
            address,
            locate,
            photo,
            contact_name,
            contact_email,
            contact_phone,
        } => {
            cli::handle_add_report(
                title,
                description,
                category,
                address,
                locate,
                photo,
                contact_name,
                contact_email,
                contact_phone,
                config.location_timeout(),
                &store,
            )?;
        }
        Commands::AddItem {
            kind,
            title,
            description,
            category,
            location,
            photo,
            contact_email,
            contact_phone,
        } => {
            cli::handle_add_item(
                kind,
                title,
                description,
                category,
                location,
                photo,
                contact_email,
                contact_phone,
                &store,
            )?;
        }
        Commands::AddPost {
            content,
            author,
            topic,
            image,
        } => {
            cli::handle_add_post(content, author, topic, image, &store)?;
        }
        Commands::AddContact {
            name,
            phone,
            relation,
        } => {
            cli::handle_add_contact(name, phone, relation, &store)?;
        }
        Commands::Going { id } => {
            cli::handle_going(id, &store)?;
        }
        Commands::Like { id } => {
            cli::handle_like(id, &store)?;
        }
        Commands::Pin { id } => {
            cli::handle_pin(id, &store)?;
        }
        Commands::SetStatus { kind, id, status } => {
            cli::handle_set_status(kind, id, status, &store)?;
        }
        Commands::Feed { limit } => {
            cli::handle_feed(limit.unwrap_or(config.feed_limit), &store)?;
        }
        Commands::Events {
            tab,
            category,
            query,
        } => {
            cli::handle_events(tab, category, query, &store)?;
        }
        Commands::Transport { filter } => {
            cli::handle_transport(filter, &store)?;
        }
    }

    Ok(())
}
