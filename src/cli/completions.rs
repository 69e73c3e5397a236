use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    stackwire completions bash > ~/.bash_completion.d/stackwire\n\n\
                  Generate zsh completions:\n    stackwire completions zsh > ~/.zfunc/_stackwire\n\n\
                  Generate fish completions:\n    stackwire completions fish > ~/.config/fish/completions/stackwire.fish\n\n\
                  Generate PowerShell completions:\n    stackwire completions powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
