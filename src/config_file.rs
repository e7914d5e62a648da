use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::VpnconfError;
use crate::options::{ConfigSource, Destination};
use crate::routes::is_route_line;

/// Reads a configuration, dropping every existing route directive.
///
/// Remaining lines keep their order and lose trailing whitespace.
pub fn read_config_no_routes(source: &ConfigSource) -> Result<Vec<String>, VpnconfError> {
    read_config_from(source, io::stdin().lock())
}

fn read_config_from<R: BufRead>(
    source: &ConfigSource,
    stdin: R,
) -> Result<Vec<String>, VpnconfError> {
    match source {
        ConfigSource::Stdin => {
            strip_routes(stdin).map_err(|err| VpnconfError::file_access("<stdin>", err))
        }
        ConfigSource::File(path) => {
            let file = File::open(path).map_err(|err| VpnconfError::file_access(path, err))?;
            strip_routes(io::BufReader::new(file))
                .map_err(|err| VpnconfError::file_access(path, err))
        }
    }
}

fn strip_routes<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if is_route_line(&line) {
            debug!("dropping existing route: {}", line.trim_end());
            continue;
        }
        lines.push(line.trim_end().to_string());
    }
    Ok(lines)
}

pub fn write_config(lines: &[String], destination: &Destination) -> Result<(), VpnconfError> {
    write_config_to(lines, destination, io::stdout().lock())
}

fn write_config_to<W: Write>(
    lines: &[String],
    destination: &Destination,
    stdout: W,
) -> Result<(), VpnconfError> {
    match destination {
        Destination::Stdout => {
            write_lines(stdout, lines).map_err(|err| VpnconfError::file_access("<stdout>", err))
        }
        Destination::InPlace(path) => write_file(lines, path),
    }
}

fn write_file(lines: &[String], path: &Path) -> Result<(), VpnconfError> {
    let file = fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(path)
        .map_err(|err| VpnconfError::file_access(path, err))?;
    write_lines(BufWriter::new(file), lines).map_err(|err| VpnconfError::file_access(path, err))
}

fn write_lines<W: Write>(mut writer: W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    #[test]
    fn drops_route_lines() {
        let config = "foo\nroute 10.0.0.0 255.0.0.0 vpn_gateway default\nbar";
        let lines = strip_routes(Cursor::new(config)).unwrap();
        assert_eq!(lines, vec!["foo", "bar"]);
    }

    #[test]
    fn keeps_other_directives_in_order() {
        let config = "client\r\n\
                      dev tun  \n\
                      route-ipv6 2001:db8::/32 default default\n\
                      route-nopull\n\
                      \n\
                      remote vpn.example.com 1194\n";
        let lines = strip_routes(Cursor::new(config)).unwrap();
        assert_eq!(
            lines,
            vec!["client", "dev tun", "route-nopull", "", "remote vpn.example.com 1194"]
        );
    }

    #[test]
    fn reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "client").unwrap();
        writeln!(file, "route 52.96.0.0 255.255.0.0 vpn_gateway default").unwrap();
        writeln!(file, "verb 3").unwrap();

        let source = ConfigSource::File(file.path().to_path_buf());
        let lines = read_config_no_routes(&source).unwrap();
        assert_eq!(lines, vec!["client", "verb 3"]);
    }

    #[test]
    fn reads_stdin() {
        let stdin = Cursor::new(
            "client\n\
             route 52.96.0.0 255.255.0.0 vpn_gateway default\n\
             verb 3\n",
        );
        let lines = read_config_from(&ConfigSource::Stdin, stdin).unwrap();
        assert_eq!(lines, vec!["client", "verb 3"]);
    }

    #[test]
    fn file_source_ignores_stdin() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "dev tun").unwrap();

        let source = ConfigSource::File(file.path().to_path_buf());
        let lines = read_config_from(&source, Cursor::new("client\n")).unwrap();
        assert_eq!(lines, vec!["dev tun"]);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ovpn");
        let err = read_config_no_routes(&ConfigSource::File(path)).unwrap_err();
        assert!(matches!(err, VpnconfError::FileAccess { .. }));
    }

    #[test]
    fn writes_in_place() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "a much longer original configuration\n").unwrap();

        let lines = vec![
            "client".to_string(),
            "route 10.0.0.0 255.255.255.0 vpn_gateway default".to_string(),
        ];
        write_config(&lines, &Destination::InPlace(file.path().to_path_buf())).unwrap();

        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "client\nroute 10.0.0.0 255.255.255.0 vpn_gateway default\n"
        );
    }

    #[test]
    fn writes_stdout() {
        let lines = vec![
            "client".to_string(),
            "route-ipv6 2603:1006::/40 default default".to_string(),
        ];
        let mut stdout = Vec::new();
        write_config_to(&lines, &Destination::Stdout, &mut stdout).unwrap();
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "client\nroute-ipv6 2603:1006::/40 default default\n"
        );
    }

    #[test]
    fn in_place_leaves_stdout_alone() {
        let file = NamedTempFile::new().unwrap();
        let mut stdout = Vec::new();
        let destination = Destination::InPlace(file.path().to_path_buf());
        write_config_to(&["verb 3".to_string()], &destination, &mut stdout).unwrap();

        assert!(stdout.is_empty());
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "verb 3\n");
    }

    #[test]
    fn write_lines_terminates_each_line() {
        let mut out = Vec::new();
        write_lines(&mut out, &["a".to_string(), "".to_string(), "b".to_string()]).unwrap();
        assert_eq!(out, b"a\n\nb\n");
    }
}
