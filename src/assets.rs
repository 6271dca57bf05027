use crate::model::Rgb;
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{channel, Receiver},
    thread,
};

// Optional per-body surface themes, loaded off the animation thread. The
// frame loop polls; it never waits. Until a theme arrives (or if it never
// does) the body renders with its built-in placeholder color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SurfaceTheme {
    pub(crate) base: Rgb,
    pub(crate) accent: Rgb,
    pub(crate) shadow: Rgb,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum AssetState {
    Pending,
    Ready(SurfaceTheme),
    Failed,
}

#[derive(Deserialize)]
struct ThemeFile {
    base: [u8; 3],
    accent: [u8; 3],
    shadow: [u8; 3],
}

fn rgb(c: [u8; 3]) -> Rgb {
    Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
    }
}

pub(crate) fn load_theme(path: &Path) -> Result<SurfaceTheme, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read {}: {}", path.display(), e))?;
    let file: ThemeFile =
        serde_json::from_str(&raw).map_err(|e| format!("parse {}: {}", path.display(), e))?;
    Ok(SurfaceTheme {
        base: rgb(file.base),
        accent: rgb(file.accent),
        shadow: rgb(file.shadow),
    })
}

pub(crate) struct AssetServer {
    rx: Receiver<(String, Result<SurfaceTheme, String>)>,
    states: HashMap<String, AssetState>,
}

impl AssetServer {
    // Fire-and-forget: one loader thread resolves every requested name and
    // reports back over a channel. Dropping the server just orphans the
    // thread, which exits on its next failed send.
    pub(crate) fn spawn(dir: PathBuf, names: &[String]) -> AssetServer {
        let (tx, rx) = channel();
        let mut states = HashMap::new();
        for n in names {
            states.insert(n.clone(), AssetState::Pending);
        }

        let requested: Vec<String> = names.to_vec();
        thread::spawn(move || {
            for name in requested {
                let path = dir.join(format!("{}.json", name.to_lowercase()));
                let res = load_theme(&path);
                if tx.send((name, res)).is_err() {
                    break;
                }
            }
        });

        AssetServer { rx, states }
    }

    pub(crate) fn poll(&mut self) {
        while let Ok((name, res)) = self.rx.try_recv() {
            let state = match res {
                Ok(theme) => AssetState::Ready(theme),
                Err(_) => AssetState::Failed,
            };
            self.states.insert(name, state);
        }
    }

    pub(crate) fn state(&self, name: &str) -> AssetState {
        self.states
            .get(name)
            .copied()
            .unwrap_or(AssetState::Failed)
    }

    pub(crate) fn theme(&self, name: &str) -> Option<SurfaceTheme> {
        match self.state(name) {
            AssetState::Ready(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_theme_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("solarsystem-themes-{}", tag));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn theme_file_parses() {
        let dir = temp_theme_dir("parse");
        let path = dir.join("earth.json");
        fs::write(
            &path,
            br#"{"base":[90,160,220],"accent":[200,230,255],"shadow":[10,20,40]}"#,
        )
        .unwrap();

        let t = load_theme(&path).unwrap();
        assert_eq!(t.base, Rgb { r: 90, g: 160, b: 220 });
        assert_eq!(t.shadow, Rgb { r: 10, g: 20, b: 40 });
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_and_malformed_files_fail_softly() {
        let dir = temp_theme_dir("bad");
        assert!(load_theme(&dir.join("nope.json")).is_err());

        let path = dir.join("broken.json");
        fs::write(&path, b"{oops").unwrap();
        assert!(load_theme(&path).is_err());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn server_resolves_to_ready_or_failed() {
        let dir = temp_theme_dir("server");
        fs::write(
            dir.join("mars.json"),
            br#"{"base":[210,90,50],"accent":[255,160,90],"shadow":[40,15,10]}"#,
        )
        .unwrap();

        let names = vec!["Mars".to_string(), "Nowhere".to_string()];
        let mut server = AssetServer::spawn(dir.clone(), &names);
        assert_eq!(server.state("Mars"), AssetState::Pending);

        // loader runs on its own thread; give it a bounded moment
        let mut waited = 0;
        while waited < 200 {
            server.poll();
            if server.state("Mars") != AssetState::Pending
                && server.state("Nowhere") != AssetState::Pending
            {
                break;
            }
            thread::sleep(Duration::from_millis(5));
            waited += 1;
        }

        assert!(matches!(server.state("Mars"), AssetState::Ready(_)));
        assert_eq!(server.state("Nowhere"), AssetState::Failed);
        assert!(server.theme("Nowhere").is_none());
        fs::remove_file(dir.join("mars.json")).ok();
    }

    #[test]
    fn unknown_names_read_as_failed() {
        let dir = temp_theme_dir("unknown");
        let server = AssetServer::spawn(dir, &[]);
        assert_eq!(server.state("NeverAsked"), AssetState::Failed);
    }
}
