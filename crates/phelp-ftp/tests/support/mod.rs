//! In-process scripted FTP server for end-to-end tests.
//!
//! Serves an in-memory tree over real sockets. File bodies are stored and
//! sent exactly as they travel on the data connection, so tests can observe
//! the client's text framing. Accepts `user`/`pw` and `anonymous`.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
pub struct Tree {
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub modes: BTreeMap<String, String>,
    /// Every command line received, passwords included.
    pub commands: Vec<String>,
}

pub struct MockServer {
    addr: SocketAddr,
    tree: Arc<Mutex<Tree>>,
}

impl MockServer {
    /// Start with `/`, `/home`, `/home/user` and `/home/user/notes.txt`.
    pub async fn start() -> Self {
        let mut tree = Tree::default();
        for d in ["/", "/home", "/home/user"] {
            tree.dirs.insert(d.to_string());
        }
        tree.files
            .insert("/home/user/notes.txt".into(), b"one\r\ntwo\r\n".to_vec());
        let tree = Arc::new(Mutex::new(tree));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = tree.clone();
        tokio::spawn(async move {
            while let Ok((sock, _)) = listener.accept().await {
                tokio::spawn(serve(sock, shared.clone()));
            }
        });
        Self { addr, tree }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `ftp://user:pw@127.0.0.1:<port><path>`
    pub fn uri(&self, path: &str) -> String {
        format!("ftp://user:pw@127.0.0.1:{}{}", self.port(), path)
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.tree.lock().unwrap().files.get(path).cloned()
    }

    pub fn add_file(&self, path: &str, body: &[u8]) {
        self.tree.lock().unwrap().files.insert(path.into(), body.to_vec());
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.tree.lock().unwrap().dirs.contains(path)
    }

    pub fn mode(&self, path: &str) -> Option<String> {
        self.tree.lock().unwrap().modes.get(path).cloned()
    }

    pub fn commands(&self) -> Vec<String> {
        self.tree.lock().unwrap().commands.clone()
    }
}

struct Conn {
    cwd: String,
    user: Option<String>,
    logged_in: bool,
    rename_from: Option<String>,
    pasv: Option<TcpListener>,
    port: Option<SocketAddr>,
}

async fn serve(sock: TcpStream, tree: Arc<Mutex<Tree>>) {
    let (rd, mut wr) = sock.into_split();
    let mut lines = BufReader::new(rd).lines();
    let mut conn = Conn {
        cwd: "/".into(),
        user: None,
        logged_in: false,
        rename_from: None,
        pasv: None,
        port: None,
    };
    reply(&mut wr, "220 phelp mock ready").await;

    while let Ok(Some(line)) = lines.next_line().await {
        tree.lock().unwrap().commands.push(line.clone());
        let (verb, arg) = match line.split_once(' ') {
            Some((v, a)) => (v.to_ascii_uppercase(), a.to_string()),
            None => (line.to_ascii_uppercase(), String::new()),
        };

        match verb.as_str() {
            "USER" => {
                conn.user = Some(arg);
                reply(&mut wr, "331 Password required").await;
            }
            "PASS" => {
                let ok = match conn.user.as_deref() {
                    Some("user") => arg == "pw",
                    Some("anonymous") => true,
                    _ => false,
                };
                conn.logged_in = ok;
                let msg = if ok { "230 Logged in" } else { "530 Login incorrect" };
                reply(&mut wr, msg).await;
            }
            "QUIT" => {
                reply(&mut wr, "221 Bye").await;
                break;
            }
            "AUTH" => reply(&mut wr, "502 TLS not available").await,
            _ if !conn.logged_in => reply(&mut wr, "530 Not logged in").await,
            "SYST" => reply(&mut wr, "215 UNIX Type: L8").await,
            "TYPE" => reply(&mut wr, "200 Type set").await,
            "PWD" => {
                let msg = format!("257 \"{}\" is current directory", conn.cwd);
                reply(&mut wr, &msg).await;
            }
            "CWD" => {
                let path = resolve(&conn.cwd, &arg);
                let exists = tree.lock().unwrap().dirs.contains(&path);
                if exists {
                    conn.cwd = path;
                    reply(&mut wr, "250 Directory changed").await;
                } else {
                    reply(&mut wr, "550 No such directory").await;
                }
            }
            "MKD" => {
                let path = resolve(&conn.cwd, &arg);
                let created = {
                    let mut t = tree.lock().unwrap();
                    let parent_ok = t.dirs.contains(&parent(&path));
                    parent_ok && !t.dirs.contains(&path) && t.dirs.insert(path.clone())
                };
                if created {
                    reply(&mut wr, &format!("257 \"{}\" created", path)).await;
                } else {
                    reply(&mut wr, "550 Permission denied").await;
                }
            }
            "RMD" => {
                let path = resolve(&conn.cwd, &arg);
                let removed = {
                    let mut t = tree.lock().unwrap();
                    let empty = children(&t, &path).is_empty();
                    path != "/" && empty && t.dirs.remove(&path)
                };
                let msg = if removed { "250 Removed" } else { "550 Cannot remove" };
                reply(&mut wr, msg).await;
            }
            "DELE" => {
                let path = resolve(&conn.cwd, &arg);
                let removed = tree.lock().unwrap().files.remove(&path).is_some();
                let msg = if removed { "250 Deleted" } else { "550 No such file" };
                reply(&mut wr, msg).await;
            }
            "RNFR" => {
                let path = resolve(&conn.cwd, &arg);
                let exists = tree.lock().unwrap().files.contains_key(&path);
                if exists {
                    conn.rename_from = Some(path);
                    reply(&mut wr, "350 Ready for RNTO").await;
                } else {
                    reply(&mut wr, "550 No such file").await;
                }
            }
            "RNTO" => match conn.rename_from.take() {
                Some(from) => {
                    let to = resolve(&conn.cwd, &arg);
                    {
                        let mut t = tree.lock().unwrap();
                        let body = t.files.remove(&from).unwrap_or_default();
                        t.files.insert(to, body);
                    }
                    reply(&mut wr, "250 Renamed").await;
                }
                None => reply(&mut wr, "503 RNFR first").await,
            },
            "SITE" => {
                let mut parts = arg.splitn(3, ' ');
                let (sub, mode, file) = (parts.next(), parts.next(), parts.next());
                let msg = match (sub.map(str::to_ascii_uppercase).as_deref(), mode, file) {
                    (Some("CHMOD"), Some(mode), Some(file)) => {
                        let path = resolve(&conn.cwd, file);
                        let mut t = tree.lock().unwrap();
                        if t.files.contains_key(&path) {
                            t.modes.insert(path, mode.to_string());
                            "200 CHMOD command successful"
                        } else {
                            "550 No such file"
                        }
                    }
                    _ => "501 Bad SITE command",
                };
                reply(&mut wr, msg).await;
            }
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let port = listener.local_addr().unwrap().port();
                conn.pasv = Some(listener);
                let msg = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{})",
                    port / 256,
                    port % 256
                );
                reply(&mut wr, &msg).await;
            }
            "PORT" => {
                let n: Vec<u16> = arg.split(',').filter_map(|p| p.parse().ok()).collect();
                if n.len() == 6 {
                    let ip = format!("{}.{}.{}.{}", n[0], n[1], n[2], n[3]);
                    conn.port = Some(format!("{}:{}", ip, n[4] * 256 + n[5]).parse().unwrap());
                    reply(&mut wr, "200 PORT ok").await;
                } else {
                    reply(&mut wr, "501 Bad PORT").await;
                }
            }
            "NLST" => {
                let dir = if arg.is_empty() {
                    conn.cwd.clone()
                } else {
                    resolve(&conn.cwd, &arg)
                };
                let listing = {
                    let t = tree.lock().unwrap();
                    t.dirs.contains(&dir).then(|| children(&t, &dir))
                };
                match listing {
                    Some(names) => {
                        let body: String = names.iter().map(|n| format!("{}\r\n", n)).collect();
                        send_data(&mut conn, &mut wr, body.as_bytes()).await;
                    }
                    None => reply(&mut wr, "550 No such directory").await,
                }
            }
            "RETR" => {
                let path = resolve(&conn.cwd, &arg);
                let body = tree.lock().unwrap().files.get(&path).cloned();
                match body {
                    Some(body) => send_data(&mut conn, &mut wr, &body).await,
                    None => {
                        conn.pasv = None;
                        reply(&mut wr, "550 No such file").await;
                    }
                }
            }
            "STOR" => {
                let path = resolve(&conn.cwd, &arg);
                let parent_exists = tree.lock().unwrap().dirs.contains(&parent(&path));
                if !parent_exists {
                    conn.pasv = None;
                    reply(&mut wr, "553 Cannot create file").await;
                    continue;
                }
                reply(&mut wr, "150 Ok to send data").await;
                let mut data = open_data(&mut conn).await;
                let mut body = Vec::new();
                data.read_to_end(&mut body).await.unwrap();
                tree.lock().unwrap().files.insert(path, body);
                reply(&mut wr, "226 Transfer complete").await;
            }
            _ => reply(&mut wr, "502 Command not implemented").await,
        }
    }
}

async fn reply(wr: &mut OwnedWriteHalf, line: &str) {
    let _ = wr.write_all(format!("{}\r\n", line).as_bytes()).await;
}

async fn open_data(conn: &mut Conn) -> TcpStream {
    if let Some(listener) = conn.pasv.take() {
        listener.accept().await.unwrap().0
    } else {
        let addr = conn.port.take().expect("PASV or PORT before transfer");
        TcpStream::connect(addr).await.unwrap()
    }
}

async fn send_data(conn: &mut Conn, wr: &mut OwnedWriteHalf, body: &[u8]) {
    reply(wr, "150 Opening data connection").await;
    let mut data = open_data(conn).await;
    data.write_all(body).await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    reply(wr, "226 Transfer complete").await;
}

fn resolve(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", cwd, path)
    };
    let mut parts: Vec<&str> = Vec::new();
    for seg in joined.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".into(),
        Some(i) => path[..i].to_string(),
    }
}

fn children(tree: &Tree, dir: &str) -> Vec<String> {
    let names = tree.dirs.iter().filter(|d| d.as_str() != "/").chain(tree.files.keys());
    names
        .filter(|p| parent(p) == dir)
        .map(|p| p.rsplit('/').next().unwrap_or_default().to_string())
        .collect()
}
