use crate::entry::Interaction;
use std::io::Write;
use std::path::PathBuf;
use toolbox_runtime::CreateSpec;
use toolbox_schema::{ContainerIdentity, ContainerName, Distro, Release};

/// Interaction that records everything and answers prompts with a fixed value.
#[derive(Debug, Default)]
pub struct RecordingUi {
    pub answer: bool,
    pub prompts: Vec<String>,
    pub notices: Vec<String>,
    pub infos: Vec<String>,
    pub terminal: Vec<u8>,
}

impl RecordingUi {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }
}

impl Interaction for RecordingUi {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_owned());
        self.answer
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_owned());
    }

    fn info(&mut self, message: &str) {
        self.infos.push(message.to_owned());
    }

    fn terminal(&mut self) -> &mut dyn Write {
        &mut self.terminal
    }
}

pub fn create_spec(name: &str) -> CreateSpec {
    CreateSpec {
        identity: ContainerIdentity::for_release(Distro::Fedora, Release::new("40"))
            .with_name(ContainerName::new(name)),
        user: "tester".to_owned(),
        uid: 1000,
        home: PathBuf::from("/home/tester"),
        shell: "/bin/bash".to_owned(),
        runtime_dir: PathBuf::from("/run/user/1000/toolbox"),
    }
}
