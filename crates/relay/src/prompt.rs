//! Interactive prompts for account and room commands.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

pub trait Prompter {
    /// Reads one line with the terminator removed.
    fn line(&mut self, label: &str) -> io::Result<String>;

    /// Like [`Prompter::line`] but without echoing what is typed.
    fn secret(&mut self, label: &str) -> io::Result<String>;
}

/// Prompts on stdout and reads from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_answer(label: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{label}: ")?;
        stdout.flush()?;
        drop(stdout);

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ));
        }
        Ok(strip_line_terminator(answer))
    }
}

impl Prompter for TerminalPrompter {
    fn line(&mut self, label: &str) -> io::Result<String> {
        Self::read_answer(label)
    }

    fn secret(&mut self, label: &str) -> io::Result<String> {
        let _echo = EchoGuard::disable(libc::STDIN_FILENO);
        let answer = Self::read_answer(label);
        println!();
        answer
    }
}

/// Answers from a fixed script, for tests and non-interactive use.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Labels asked so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn next(&mut self, label: &str) -> io::Result<String> {
        self.asked.push(label.to_string());
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, format!("no answer for '{label}'"))
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn line(&mut self, label: &str) -> io::Result<String> {
        self.next(label)
    }

    fn secret(&mut self, label: &str) -> io::Result<String> {
        self.next(label)
    }
}

fn strip_line_terminator(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// Restores the saved terminal attributes on drop. Inert when the fd is not a
/// terminal.
struct EchoGuard {
    #[cfg(unix)]
    saved: Option<(libc::c_int, libc::termios)>,
}

impl EchoGuard {
    #[cfg(unix)]
    fn disable(fd: libc::c_int) -> Self {
        let Ok(original) = get_termios(fd) else {
            return Self { saved: None };
        };
        let mut silent = original;
        silent.c_lflag &= !libc::ECHO;
        if set_termios(fd, &silent).is_err() {
            return Self { saved: None };
        }
        Self {
            saved: Some((fd, original)),
        }
    }

    #[cfg(not(unix))]
    fn disable(_fd: i32) -> Self {
        Self {}
    }
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some((fd, original)) = self.saved.take() {
            let _ = set_termios(fd, &original);
        }
    }
}

#[cfg(unix)]
fn get_termios(fd: libc::c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: libc::c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_are_returned_in_order() {
        let mut prompter = ScriptedPrompter::new(["alice@example.com", "hunter2"]);

        assert_eq!(prompter.line("Email").unwrap(), "alice@example.com");
        assert_eq!(prompter.secret("Password").unwrap(), "hunter2");
        assert!(prompter.line("Username").is_err());
        assert_eq!(prompter.asked(), ["Email", "Password", "Username"]);
    }

    #[test]
    fn only_the_terminator_is_stripped() {
        assert_eq!(strip_line_terminator(" spaced \r\n".to_string()), " spaced ");
        assert_eq!(strip_line_terminator("bare".to_string()), "bare");
    }

    #[cfg(unix)]
    #[test]
    fn echo_guard_is_inert_on_a_bad_fd() {
        let guard = EchoGuard::disable(-1);
        assert!(guard.saved.is_none());
    }
}
