use clap::Parser;
use itaccess::cli::commands::add::AddArgs;
use itaccess::cli::commands::edit::EditArgs;
use itaccess::cli::commands::{
    add, archive, audit_cmd, completions, delete, edit, init, list, password, records, show, ssl,
};
use itaccess::cli::{Cli, Commands, SslAction};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => init::execute(&cli),
        Commands::Add {
            ref username,
            equipment,
            site,
            partner,
            company,
            ref password,
            generate,
            encrypt,
        } => add::execute(
            &cli,
            &AddArgs {
                username,
                equipment,
                site,
                partner,
                company,
                password: password.as_deref(),
                generate,
                encrypt,
            },
        ),
        Commands::List {
            all,
            equipment,
            json,
        } => list::execute(&cli, all, equipment, json),
        Commands::Show { id, json } => show::execute(&cli, id, json),
        Commands::Edit {
            id,
            ref username,
            equipment,
            no_equipment,
            site,
            no_site,
            partner,
            no_partner,
            company,
        } => edit::execute(
            &cli,
            id,
            &EditArgs {
                username: username.as_deref(),
                equipment,
                no_equipment,
                site,
                no_site,
                partner,
                no_partner,
                company,
            },
        ),
        Commands::SetPassword { id, ref value } => {
            password::execute_set(&cli, id, value.as_deref())
        }
        Commands::Generate { ref ids } => password::execute_generate(&cli, ids),
        Commands::Encrypt { ref ids } => password::execute_encrypt(&cli, ids),
        Commands::Decrypt { ref ids, copy } => password::execute_decrypt(&cli, ids, copy),
        Commands::Archive { ref ids } => archive::execute(&cli, ids, false),
        Commands::Unarchive { ref ids } => archive::execute(&cli, ids, true),
        Commands::Delete { id, force } => delete::execute(&cli, id, force),
        Commands::Ssl { ref action } => match action {
            SslAction::Attach { id, kind, ref file } => ssl::execute_attach(&cli, *id, *kind, file),
            SslAction::Export {
                id,
                kind,
                ref output,
            } => ssl::execute_export(&cli, *id, *kind, output.as_deref()),
            SslAction::Remove { id, kind } => ssl::execute_remove(&cli, *id, *kind),
            SslAction::List { id } => ssl::execute_list(&cli, *id),
        },
        Commands::Company { ref action } => records::execute_company(&cli, action),
        Commands::Partner { ref action } => records::execute_partner(&cli, action),
        Commands::Site { ref action } => records::execute_site(&cli, action),
        Commands::Equipment { ref action } => records::execute_equipment(&cli, action),
        Commands::Audit {
            last,
            ref since,
            access,
        } => audit_cmd::execute(&cli, last, since.as_deref(), access),
        Commands::Completions { shell } => completions::execute(shell),
    };

    if let Err(e) = result {
        itaccess::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
