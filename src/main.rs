//! EvoDB - A git-like version control engine for relational schemas.
//!
//! This is the main entry point for the EvoDB command-line interface.

use std::error::Error;
use std::process::ExitCode;

use evodb::deploy;
use evodb::history::CommitId;
use evodb::repo::{RepoError, Repository};
use evodb::store::FileStore;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return ExitCode::FAILURE;
    }

    let result = match args[1].as_str() {
        "init" => cmd_init(&args[2..]),
        "branch" => cmd_branch(&args[2..]),
        "verify" => cmd_verify(&args[2..]),
        "commit" => cmd_commit(&args[2..]),
        "log" => cmd_log(&args[2..]),
        "migrate" => cmd_migrate(&args[2..]),
        "-h" | "--help" | "help" => {
            print_help();
            return ExitCode::SUCCESS;
        }
        "--version" => {
            println!("evodb v{}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("EvoDB - A git-like version control engine for relational schemas");
    println!();
    println!("Usage: evodb <COMMAND> [ARGS]");
    println!();
    println!("Commands:");
    println!("  init <dir>                       Initialize a repository directory");
    println!("  branch <dir> <name> [parent]     Create a branch, optionally from a parent branch");
    println!("  verify <dir> <branch>            Validate the staged changes against a branch");
    println!("  commit <dir> <branch> <msg>      Commit the staged changes to a branch");
    println!("  log <dir> <branch>               Show a branch's history, oldest first");
    println!("  migrate <dir> <from> <to> [--sql]");
    println!("                                   Print the migration plan between two");
    println!("                                   branches or commit ids, as JSON or SQL");
    println!();
    println!("Examples:");
    println!("  evodb init ./schemas");
    println!("  evodb branch ./schemas master");
    println!("  evodb commit ./schemas master 'create person table'");
    println!("  evodb migrate ./schemas b1 b2 --sql");
}

fn cmd_init(args: &[String]) -> Result<(), Box<dyn Error>> {
    let dir = args.first().ok_or("usage: evodb init <dir>")?;
    FileStore::init(dir)?;
    println!("Initialized empty repository in {}", dir);
    Ok(())
}

fn cmd_branch(args: &[String]) -> Result<(), Box<dyn Error>> {
    let (dir, name) = match args {
        [dir, name] | [dir, name, _] => (dir, name),
        _ => return Err("usage: evodb branch <dir> <name> [parent]".into()),
    };
    let parent = args.get(2).map(String::as_str);

    let store = FileStore::open(dir)?;
    let mut repo = store.load()?;
    let branch = repo.branch(name, parent)?;
    println!(
        "Created branch {} at commit {}",
        branch.name(),
        branch.parent().id().short()
    );
    store.save(&repo)?;
    Ok(())
}

fn cmd_verify(args: &[String]) -> Result<(), Box<dyn Error>> {
    let [dir, branch] = args else {
        return Err("usage: evodb verify <dir> <branch>".into());
    };

    let store = FileStore::open(dir)?;
    let repo = store.load()?;
    let staged = store.staged_changes()?;

    repo.verify(branch, &staged)?;
    println!("{} staged change(s) verified against {}", staged.len(), branch);
    Ok(())
}

fn cmd_commit(args: &[String]) -> Result<(), Box<dyn Error>> {
    let [dir, branch, msg] = args else {
        return Err("usage: evodb commit <dir> <branch> <msg>".into());
    };

    let store = FileStore::open(dir)?;
    let mut repo = store.load()?;
    let staged = store.staged_changes()?;

    let commit_id = repo.commit(branch, staged, msg.as_str())?;
    store.save(&repo)?;
    store.clear_staged_changes()?;

    println!("[{} {}] {}", branch, commit_id.short(), msg);
    Ok(())
}

fn cmd_log(args: &[String]) -> Result<(), Box<dyn Error>> {
    let [dir, branch] = args else {
        return Err("usage: evodb log <dir> <branch>".into());
    };

    let store = FileStore::open(dir)?;
    let repo = store.load()?;

    let head = repo.resolve_branch(branch)?.clone();
    for commit_id in repo.ancestors(&head)? {
        let record = repo.record(&commit_id)?;
        println!("{}  {}", commit_id.short(), record.msg);
    }
    Ok(())
}

fn cmd_migrate(args: &[String]) -> Result<(), Box<dyn Error>> {
    let (dir, from, to) = match args {
        [dir, from, to] => (dir, from, to),
        [dir, from, to, flag] if flag.as_str() == "--sql" => (dir, from, to),
        _ => return Err("usage: evodb migrate <dir> <from> <to> [--sql]".into()),
    };
    let as_sql = args.len() == 4;

    let store = FileStore::open(dir)?;
    let repo = store.load()?;

    let from_id = resolve_target(&repo, from)?;
    let to_id = resolve_target(&repo, to)?;
    let plan = repo.migrate(&from_id, &to_id)?;

    if as_sql {
        print!("{}", deploy::render_script(&plan)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    }
    Ok(())
}

/// Resolve a branch name or a literal commit id.
fn resolve_target(repo: &Repository, name_or_id: &str) -> Result<CommitId, RepoError> {
    if let Ok(commit_id) = repo.resolve_branch(name_or_id) {
        return Ok(commit_id.clone());
    }
    let commit_id = CommitId::new(name_or_id);
    if repo.contains_commit(&commit_id) {
        Ok(commit_id)
    } else {
        Err(RepoError::CommitNotFound(name_or_id.to_string()))
    }
}
