//! Subcommand handlers. Each returns the text to print on success.

use anyhow::{bail, Context};
use clap::ArgMatches;
use gatehouse_auth::{AuthServer, AuthServerConfig};
use gatehouse_core::auth::NativeAuthority;
use gatehouse_core::*;
use gatehouse_engine::StorageEngine;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub fn run(engine: &StorageEngine, domain: &str, matches: &ArgMatches) -> anyhow::Result<String> {
    let server = AuthServer::new(
        engine.services()?,
        Arc::new(NativeAuthority::new()),
        domain,
        AuthServerConfig::default(),
    );

    let output = match matches.subcommand() {
        Some(("init", _)) => init(&server)?,
        Some(("token", token)) => match token.subcommand() {
            Some(("add", args)) => token_add(&server, args)?,
            Some(("ls", _)) => token_ls(&server)?,
            Some(("rm", args)) => token_rm(&server, args)?,
            _ => bail!("unknown token command"),
        },
        Some(("user", user)) => match user.subcommand() {
            Some(("add", args)) => user_add(&server, args)?,
            _ => bail!("unknown user command"),
        },
        Some(("sign-in", args)) => sign_in(&server, args)?,
        Some(("join", args)) => join(&server, args)?,
        _ => bail!("unknown command"),
    };

    engine.persist()?;
    Ok(output)
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing --{}", name))
}

fn init(server: &AuthServer) -> anyhow::Result<String> {
    server.init_authority()?;
    Ok(format!("authority for {} is ready", server.get_local_domain()))
}

fn token_add(server: &AuthServer, args: &ArgMatches) -> anyhow::Result<String> {
    let node = arg(args, "node")?;
    let role: Role = arg(args, "role")?.parse()?;
    let ttl = args.get_one::<u64>("ttl").copied().unwrap_or(0);

    let token = server.generate_token(node, role, Duration::from_secs(ttl))?;
    info!(node = node, %role, "issued join token");
    Ok(token)
}

fn token_ls(server: &AuthServer) -> anyhow::Result<String> {
    let lines: Vec<String> = server
        .get_tokens()?
        .into_iter()
        .map(|t| {
            let expires = t.expires.map_or_else(|| "never".to_string(), |e| e.to_rfc3339());
            format!("{}\t{}\t{}", JoinToken::new(t.token, t.role), t.domain_name, expires)
        })
        .collect();
    Ok(lines.join("\n"))
}

fn token_rm(server: &AuthServer, args: &ArgMatches) -> anyhow::Result<String> {
    server.delete_token(arg(args, "token")?)?;
    Ok("token deleted".to_string())
}

fn user_add(server: &AuthServer, args: &ArgMatches) -> anyhow::Result<String> {
    let name = arg(args, "name")?;
    let mut user = User::new(name);
    user.allowed_logins = args
        .get_many::<String>("login")
        .map(|logins| logins.cloned().collect())
        .unwrap_or_default();

    let users = &server.services().users;
    users.upsert_user(user)?;
    users.upsert_password(name, arg(args, "password")?.as_bytes())?;
    Ok(format!("user {} saved", name))
}

fn sign_in(server: &AuthServer, args: &ArgMatches) -> anyhow::Result<String> {
    let name = arg(args, "name")?;
    let session = server.sign_in(name, arg(args, "password")?.as_bytes())?;

    let view = serde_json::json!({
        "id": session.id,
        "user": session.user.name,
        "expires": session.ws.expires.to_rfc3339(),
        "bearer_token": session.ws.bearer_token,
    });
    Ok(serde_json::to_string_pretty(&view)?)
}

fn join(server: &AuthServer, args: &ArgMatches) -> anyhow::Result<String> {
    let node = arg(args, "node")?;
    let role: Role = arg(args, "role")?.parse()?;
    let out = PathBuf::from(arg(args, "out")?);

    // Both files must be creatable before the token is spent.
    std::fs::create_dir_all(&out).with_context(|| format!("failed to create {}", out.display()))?;
    let key_path = out.join(format!("{}.key", node));
    let cert_path = out.join(format!("{}.cert", node));
    let mut key_file = create_private(&key_path)?;
    let mut cert_file = match create_file(&cert_path) {
        Ok(file) => file,
        Err(e) => {
            discard(&[key_path.as_path()]);
            return Err(e);
        }
    };

    let keys = match server.register_using_token(arg(args, "token")?, node, role) {
        Ok(keys) => keys,
        Err(e) => {
            discard(&[key_path.as_path(), cert_path.as_path()]);
            return Err(e.into());
        }
    };

    key_file
        .write_all((hex::encode(&keys.key) + "\n").as_bytes())
        .with_context(|| format!("failed to write {}", key_path.display()))?;
    cert_file
        .write_all(&keys.cert)
        .with_context(|| format!("failed to write {}", cert_path.display()))?;

    Ok(format!("wrote {} and {}", key_path.display(), cert_path.display()))
}

fn create_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

/// Create a file only the current user can read
fn create_private(path: &Path) -> anyhow::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

fn discard(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("failed to remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::auth::Certificate;

    fn exec(engine: &StorageEngine, args: &[&str]) -> anyhow::Result<String> {
        let argv = ["gatehouse", "--domain", "cluster.example"].iter().chain(args.iter());
        let matches = crate::cli().try_get_matches_from(argv)?;
        run(engine, "cluster.example", &matches)
    }

    #[test]
    fn test_token_lifecycle() {
        let temp = tempfile::tempdir().unwrap();
        let engine = StorageEngine::new(temp.path()).unwrap();
        exec(&engine, &["init"]).unwrap();

        let token = exec(&engine, &["token", "add", "--node", "db1", "--ttl", "0"]).unwrap();
        assert!(token.ends_with(".Node"));

        let listed = exec(&engine, &["token", "ls"]).unwrap();
        assert!(listed.contains(&token));
        assert!(listed.contains("never"));

        exec(&engine, &["token", "rm", &token]).unwrap();
        assert_eq!(exec(&engine, &["token", "ls"]).unwrap(), "");
    }

    #[test]
    fn test_join_writes_key_and_cert() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("out");
        let engine = StorageEngine::new(temp.path().join("data")).unwrap();
        let out_dir = out.to_str().unwrap();

        exec(&engine, &["init"]).unwrap();
        let token = exec(&engine, &["token", "add", "--node", "db1"]).unwrap();
        exec(&engine, &["join", "--token", &token, "--node", "db1", "--out", out_dir]).unwrap();

        let key = std::fs::read_to_string(out.join("db1.key")).unwrap();
        assert_eq!(key.trim().len(), 64);
        let cert = std::fs::read(out.join("db1.cert")).unwrap();

        let ca = engine
            .services()
            .unwrap()
            .ca
            .get_cert_authority(&CertAuthId::new(CertAuthType::Host, "cluster.example"), false)
            .unwrap();
        let verified = Certificate::verify(&cert, &ca.checking_keys[0]).unwrap();
        assert_eq!(verified.claims.principal, "db1.cluster.example");

        // the token is spent
        let again = temp.path().join("again");
        assert!(exec(&engine, &["join", "--token", &token, "--node", "db1", "--out", again.to_str().unwrap()]).is_err());
        assert!(!again.join("db1.key").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_join_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("out");
        let engine = StorageEngine::new(temp.path().join("data")).unwrap();

        exec(&engine, &["init"]).unwrap();
        let token = exec(&engine, &["token", "add", "--node", "db1"]).unwrap();
        exec(&engine, &["join", "--token", &token, "--node", "db1", "--out", out.to_str().unwrap()]).unwrap();

        let mode = std::fs::metadata(out.join("db1.key")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_join_into_unusable_out_keeps_token() {
        let temp = tempfile::tempdir().unwrap();
        let engine = StorageEngine::new(temp.path().join("data")).unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        exec(&engine, &["init"]).unwrap();
        let token = exec(&engine, &["token", "add", "--node", "db1"]).unwrap();
        let out = blocker.join("out");
        assert!(exec(&engine, &["join", "--token", &token, "--node", "db1", "--out", out.to_str().unwrap()]).is_err());

        assert!(exec(&engine, &["token", "ls"]).unwrap().contains(&token));
    }

    #[test]
    fn test_failed_join_removes_created_files() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("out");
        let engine = StorageEngine::new(temp.path().join("data")).unwrap();

        exec(&engine, &["init"]).unwrap();
        let token = exec(&engine, &["token", "add", "--node", "db1"]).unwrap();
        let result = exec(&engine, &["join", "--token", &token, "--node", "db2", "--out", out.to_str().unwrap()]);
        assert!(result.is_err());

        assert!(!out.join("db2.key").exists());
        assert!(!out.join("db2.cert").exists());
        assert!(exec(&engine, &["token", "ls"]).unwrap().contains(&token));
    }

    #[test]
    fn test_user_sign_in() {
        let temp = tempfile::tempdir().unwrap();
        let engine = StorageEngine::new(temp.path()).unwrap();
        exec(&engine, &["init"]).unwrap();
        exec(&engine, &["user", "add", "alice", "--password", "hunter2", "--login", "root"]).unwrap();

        let output = exec(&engine, &["sign-in", "alice", "--password", "hunter2"]).unwrap();
        let session: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(session["user"], "alice");
        assert_eq!(session["bearer_token"].as_str().unwrap().len(), 64);

        assert!(exec(&engine, &["sign-in", "alice", "--password", "wrong"]).is_err());
    }
}
