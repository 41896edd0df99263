//! `makemkvcon` wrapper.
//!
//! makemkvcon is driven in robot mode (`-r`), where every line of stdout is a
//! tagged, comma-separated record:
//!
//! ```text
//! DRV:0,2,999,1,"BD-ROM HL-DT-ST BDDVDRW","INCEPTION","/dev/sr0"
//! TINFO:0,9,0,"2:28:07"
//! TINFO:0,27,0,"title_t00.mkv"
//! MSG:5036,0,1,"Copy complete. 1 titles saved.","Copy complete. %1 titles saved.","1"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use crate::error::{CoreResult, collaborator_error};
use crate::external::{Disc, DiscRipper, Track};
use crate::util::command::{capture_command, run_streaming};
use crate::utils::parse_hms;

/// `DRV` state value for a drive with a disc inserted.
const DRIVE_STATE_INSERTED: &str = "2";
/// `TINFO` attribute ids.
const ATTR_DURATION: u32 = 9;
const ATTR_FILE_NAME: u32 = 27;
/// `MSG` code reported when a copy finishes.
const MSG_COPY_COMPLETE: u32 = 5036;

const TOOL: &str = "makemkvcon";

#[derive(Debug, Clone)]
pub struct MakeMkv {
    binary: String,
    cache_mb: u32,
}

impl MakeMkv {
    pub fn new(binary: &str, cache_mb: u32) -> Self {
        Self {
            binary: binary.to_string(),
            cache_mb,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-r");
        cmd
    }
}

impl DiscRipper for MakeMkv {
    fn enumerate_discs(&self) -> CoreResult<Vec<Disc>> {
        // disc:9999 is never a real disc; makemkvcon lists every drive and exits.
        let output = capture_command(self.command().args(["info", "disc:9999"]))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let discs = parse_drives(&stdout);
        log::debug!("{} reported {} inserted disc(s)", TOOL, discs.len());
        Ok(discs)
    }

    fn track_info(&self, disc: &Disc) -> CoreResult<Vec<Track>> {
        let output = capture_command(
            self.command()
                .arg(format!("--cache={}", self.cache_mb))
                .arg("info")
                .arg(format!("disc:{}", disc.index)),
        )?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let tracks = parse_tracks(&stdout);
        if tracks.is_empty() && !output.status.success() {
            let detail = last_message(&stdout)
                .unwrap_or_else(|| format!("exited with {}", output.status));
            return Err(collaborator_error(TOOL, detail));
        }
        Ok(tracks)
    }

    fn extract(&self, disc: &Disc, track: &Track, dest: &Path) -> CoreResult<()> {
        let mut messages = Vec::new();
        let mut saved = None;
        run_streaming(
            self.command()
                .arg(format!("--cache={}", self.cache_mb))
                .arg("--noscan")
                .arg("mkv")
                .arg(format!("disc:{}", disc.index))
                .arg(track.index.to_string())
                .arg(dest),
            &mut |line| {
                if let Some(msg) = parse_message(line) {
                    log::debug!("{}: {}", TOOL, msg.text);
                    if msg.code == MSG_COPY_COMPLETE {
                        saved = Some(msg.params.first().and_then(|p| p.parse::<u32>().ok()));
                    }
                    messages.push(msg.text);
                }
            },
        )
        .map_err(|e| collaborator_error(TOOL, e.to_string()))?;

        match saved {
            Some(Some(0)) | None => Err(collaborator_error(
                TOOL,
                messages
                    .last()
                    .cloned()
                    .unwrap_or_else(|| "no titles saved".to_string()),
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Splits one robot-mode record body on commas outside double quotes.
pub(crate) fn split_fields(body: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn record<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    line.strip_prefix(tag)?.strip_prefix(':')
}

pub(crate) fn parse_drives(output: &str) -> Vec<Disc> {
    output
        .lines()
        .filter_map(|line| record(line.trim(), "DRV"))
        .filter_map(|body| {
            let fields = split_fields(body);
            if fields.len() < 7 || fields[1] != DRIVE_STATE_INSERTED || fields[5].is_empty() {
                return None;
            }
            Some(Disc {
                index: fields[0].parse().ok()?,
                label: fields[5].clone(),
                location: fields[6].clone(),
            })
        })
        .collect()
}

pub(crate) fn parse_tracks(output: &str) -> Vec<Track> {
    let mut durations: BTreeMap<u32, u64> = BTreeMap::new();
    let mut names: BTreeMap<u32, String> = BTreeMap::new();

    for body in output.lines().filter_map(|line| record(line.trim(), "TINFO")) {
        let fields = split_fields(body);
        if fields.len() < 4 {
            continue;
        }
        let (Ok(index), Ok(attr)) = (fields[0].parse::<u32>(), fields[1].parse::<u32>()) else {
            continue;
        };
        match attr {
            ATTR_DURATION => {
                if let Some(secs) = parse_hms(&fields[3]) {
                    durations.insert(index, secs);
                }
            }
            ATTR_FILE_NAME => {
                names.insert(index, fields[3].clone());
            }
            _ => {}
        }
    }

    names
        .into_iter()
        .filter_map(|(index, file_name)| {
            durations.get(&index).map(|&duration_secs| Track {
                index,
                duration_secs,
                file_name,
            })
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Message {
    pub code: u32,
    pub text: String,
    pub params: Vec<String>,
}

pub(crate) fn parse_message(line: &str) -> Option<Message> {
    let fields = split_fields(record(line.trim(), "MSG")?);
    if fields.len() < 4 {
        return None;
    }
    Some(Message {
        code: fields[0].parse().ok()?,
        text: fields[3].clone(),
        params: fields.iter().skip(5).cloned().collect(),
    })
}

fn last_message(output: &str) -> Option<String> {
    output.lines().filter_map(parse_message).map(|m| m.text).last()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVES: &str = r#"MSG:1005,0,1,"MakeMKV v1.17.7 linux(x64-release) started","%1 started","MakeMKV v1.17.7 linux(x64-release)"
DRV:0,2,999,1,"BD-ROM HL-DT-ST BDDVDRW","INCEPTION","/dev/sr0"
DRV:1,0,999,0,"DVD+R-DL ATAPI","","/dev/sr1"
DRV:2,256,999,0,"","",""
"#;

    const TRACKS: &str = r#"TCOUNT:3
TINFO:0,2,0,"Inception"
TINFO:0,9,0,"2:28:07"
TINFO:0,27,0,"title_t00.mkv"
TINFO:1,9,0,"0:02:11"
TINFO:1,27,0,"title_t01.mkv"
TINFO:2,9,0,"1:05:00"
TINFO:2,27,0,"Inception, \"Extended\".mkv"
"#;

    #[test]
    fn test_split_fields_respects_quotes() {
        assert_eq!(
            split_fields(r#"0,2,"a, b","x \"y\"""#),
            vec!["0", "2", "a, b", "x \"y\""]
        );
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn test_only_inserted_drives_are_listed() {
        let discs = parse_drives(DRIVES);
        assert_eq!(
            discs,
            vec![Disc {
                index: 0,
                label: "INCEPTION".into(),
                location: "/dev/sr0".into(),
            }]
        );
    }

    #[test]
    fn test_tracks_pair_duration_and_file_name() {
        let tracks = parse_tracks(TRACKS);
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].duration_secs, 8887);
        assert_eq!(tracks[0].file_name, "title_t00.mkv");
        assert_eq!(tracks[1].duration_secs, 131);
        assert_eq!(tracks[2].file_name, "Inception, \"Extended\".mkv");
    }

    #[test]
    fn test_parse_copy_complete_message() {
        let msg = parse_message(
            r#"MSG:5036,0,1,"Copy complete. 1 titles saved.","Copy complete. %1 titles saved.","1""#,
        )
        .unwrap();
        assert_eq!(msg.code, MSG_COPY_COMPLETE);
        assert_eq!(msg.text, "Copy complete. 1 titles saved.");
        assert_eq!(msg.params, vec!["1"]);
        assert!(parse_message("PRGV:1,2,3").is_none());
    }

    #[test]
    fn test_canonical_title_from_label() {
        let ripper = MakeMkv::new("makemkvcon", 1024);
        let disc = parse_drives(DRIVES).remove(0);
        assert_eq!(ripper.canonical_title(&disc), "Inception");
    }
}
