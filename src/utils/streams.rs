// src/utils/streams.rs
use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChildStream {
    Stdout,
}

/// Collects every line a child process writes to one of its output streams.
///
/// # Arguments
///
/// * `child` - Spawned child with the requested stream piped.
/// * `stream` - Which stream to drain.
///
/// # Returns
/// Lines without their terminators, in output order.
///
pub async fn read_child_output_to_vec(child: &mut Child, stream: ChildStream) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    match stream {
        ChildStream::Stdout => {
            let stdout = child.stdout.take().ok_or_else(|| anyhow!("Child stdout was not piped"))?;
            let mut reader = BufReader::new(stdout).lines();
            while let Some(line) = reader.next_line().await? {
                lines.push(line);
            }
        }
    }
    Ok(lines)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_stdout_lines() -> Result<()> {
        let mut child = Command::new("printf")
            .arg("one\\ntwo\\n")
            .stdout(Stdio::piped())
            .spawn()?;
        let lines = read_child_output_to_vec(&mut child, ChildStream::Stdout).await?;
        child.wait().await?;
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unpiped_stream_is_an_error() -> Result<()> {
        let mut child = Command::new("true").stdout(Stdio::null()).spawn()?;
        assert!(read_child_output_to_vec(&mut child, ChildStream::Stdout).await.is_err());
        child.wait().await?;
        Ok(())
    }
}
