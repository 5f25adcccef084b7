use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use log::{debug, error, info};
use rodio::{decoder::DecoderError, Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use thiserror::Error;

use crate::communication::AudioCommand;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("couldn't open the audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("couldn't open sound file: {0}")]
    Open(#[from] io::Error),
    #[error("couldn't decode sound file: {0}")]
    Decode(#[from] DecoderError),
}

/// something that can loop a sound file
pub trait Output {
    type Voice: Voice;

    fn start_loop(&self, path: &Path) -> Result<Self::Voice, AudioError>;
}

/// a sound that is currently playing
pub trait Voice {
    fn halt(&self);
}

/// Owns the output device and at most one playing sound.
pub struct Player<O: Output> {
    output: O,
    current: Option<O::Voice>,
}

impl<O: Output> Player<O> {
    pub const fn new(output: O) -> Self {
        Self {
            output,
            current: None,
        }
    }

    pub fn handle(&mut self, command: AudioCommand) {
        // the old sound always goes before anything new starts
        if let Some(voice) = self.current.take() {
            voice.halt();
        }
        match command {
            AudioCommand::Play(path) => match self.output.start_loop(&path) {
                Ok(voice) => {
                    info!("playing {}", path.display());
                    self.current = Some(voice);
                }
                Err(e) => error!("error playing sound {}: {e}", path.display()),
            },
            AudioCommand::Stop => debug!("sound stopped"),
        }
    }

    pub const fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn run(mut self, receiver: &Receiver<AudioCommand>) {
        for command in receiver {
            self.handle(command);
        }
        if let Some(voice) = self.current.take() {
            voice.halt();
        }
    }
}

pub struct RodioOutput {
    stream: OutputStream,
}

impl RodioOutput {
    pub fn open() -> Result<Self, AudioError> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        Ok(Self { stream })
    }
}

impl Output for RodioOutput {
    type Voice = Sink;

    fn start_loop(&self, path: &Path) -> Result<Sink, AudioError> {
        let file = BufReader::new(File::open(path)?);
        // create source that repeatedly plays the sound
        let source = Decoder::new(file)?.repeat_infinite();
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.play();
        Ok(sink)
    }
}

impl Voice for Sink {
    fn halt(&self) {
        self.stop();
    }
}

/// Fire and forget handle to the audio thread.
#[derive(Debug, Clone)]
pub struct AudioHandle {
    sender: Sender<AudioCommand>,
}

impl AudioHandle {
    /// starts the audio thread, if there is no output device commands are dropped
    #[must_use]
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || match RodioOutput::open() {
                Ok(output) => Player::new(output).run(&receiver),
                Err(e) => {
                    error!("{e}");
                    for command in receiver {
                        debug!("no audio output, dropping {command:?}");
                    }
                }
            });
        if let Err(e) = spawned {
            error!("couldn't start audio thread: {e}");
        }
        Self { sender }
    }

    #[must_use]
    pub const fn from_sender(sender: Sender<AudioCommand>) -> Self {
        Self { sender }
    }

    pub fn play(&self, path: &Path) {
        self.send(AudioCommand::Play(path.to_path_buf()));
    }

    pub fn stop(&self) {
        self.send(AudioCommand::Stop);
    }

    fn send(&self, command: AudioCommand) {
        if self.sender.send(command).is_err() {
            debug!("audio thread is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, path::PathBuf, rc::Rc};

    type Log = Rc<RefCell<Vec<String>>>;

    struct FakeOutput {
        log: Log,
    }

    struct FakeVoice {
        name: String,
        log: Log,
    }

    impl Output for FakeOutput {
        type Voice = FakeVoice;

        fn start_loop(&self, path: &Path) -> Result<FakeVoice, AudioError> {
            let name = path.display().to_string();
            if name.ends_with(".missing") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "gone").into());
            }
            self.log.borrow_mut().push(format!("start {name}"));
            Ok(FakeVoice {
                name,
                log: self.log.clone(),
            })
        }
    }

    impl Voice for FakeVoice {
        fn halt(&self) {
            self.log.borrow_mut().push(format!("stop {}", self.name));
        }
    }

    fn player() -> (Player<FakeOutput>, Log) {
        let log = Log::default();
        (Player::new(FakeOutput { log: log.clone() }), log)
    }

    #[test]
    fn new_sound_stops_the_old_one_first() {
        let (mut player, log) = player();
        player.handle(AudioCommand::Play(PathBuf::from("a.wav")));
        player.handle(AudioCommand::Play(PathBuf::from("b.wav")));
        assert_eq!(
            *log.borrow(),
            vec!["start a.wav", "stop a.wav", "start b.wav"]
        );
        assert!(player.is_playing());
    }

    #[test]
    fn stop_silences() {
        let (mut player, log) = player();
        player.handle(AudioCommand::Stop);
        assert!(log.borrow().is_empty());
        player.handle(AudioCommand::Play(PathBuf::from("a.wav")));
        player.handle(AudioCommand::Stop);
        assert!(!player.is_playing());
        assert_eq!(*log.borrow(), vec!["start a.wav", "stop a.wav"]);
    }

    #[test]
    fn failed_play_is_swallowed() {
        let (mut player, log) = player();
        player.handle(AudioCommand::Play(PathBuf::from("a.wav")));
        player.handle(AudioCommand::Play(PathBuf::from("b.missing")));
        assert!(!player.is_playing());
        assert_eq!(*log.borrow(), vec!["start a.wav", "stop a.wav"]);
    }

    #[test]
    fn run_drains_until_disconnect() {
        let (player, log) = player();
        let (sender, receiver) = mpsc::channel();
        let handle = AudioHandle::from_sender(sender);
        handle.play(Path::new("a.wav"));
        handle.stop();
        handle.play(Path::new("b.wav"));
        drop(handle);
        player.run(&receiver);
        assert_eq!(
            *log.borrow(),
            vec!["start a.wav", "stop a.wav", "start b.wav", "stop b.wav"]
        );
    }

    #[test]
    fn handle_ignores_a_dead_thread() {
        let (sender, receiver) = mpsc::channel();
        drop(receiver);
        let handle = AudioHandle::from_sender(sender);
        handle.play(Path::new("a.wav"));
        handle.stop();
    }
}
