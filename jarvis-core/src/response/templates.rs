//! Template pools, keyed by response category and (for the social
//! categories) tone.
//!
//! Placeholders: `{name}`, `{time}` ("Good morning"), `{period}`
//! ("morning"), `{topic}`, `{value}`, `{percent}`, `{expr}`, `{result}`,
//! `{clock}`, `{date}`, `{knowledge}`, `{location}`, `{note}`, `{task}`,
//! `{when}`, `{count}`, `{items}`, `{kind}`.

use serde::Serialize;

/// Register of a response, derived from emotional intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Intensity above 0.8.
    Enthusiastic,
    /// Between the two cut-offs.
    Casual,
    /// Intensity below 0.3.
    Formal,
}

impl Tone {
    /// Tone for an emotional intensity.
    #[must_use]
    pub fn from_intensity(intensity: f32) -> Self {
        if intensity > 0.8 {
            Self::Enthusiastic
        } else if intensity < 0.3 {
            Self::Formal
        } else {
            Self::Casual
        }
    }
}

/// What kind of answer was produced. Anti-repetition history is kept per
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    /// Hello.
    Greeting,
    /// Goodbye.
    Farewell,
    /// A fact was stored.
    MemoryStore,
    /// A stored fact was reported.
    MemoryRecall,
    /// The asked-for fact is unknown.
    RecallMissing,
    /// A question answered from external knowledge.
    KnowledgeAnswer,
    /// A question answered from stored facts.
    MemoryAnswer,
    /// The utterance wasn't understood.
    Clarify,
    /// Arithmetic result.
    Calculation,
    /// Arithmetic that couldn't be evaluated.
    CalculationFailed,
    /// Clock time.
    Time,
    /// Calendar date.
    Date,
    /// Weather report.
    Weather,
    /// No weather source.
    WeatherUnavailable,
    /// A joke.
    Joke,
    /// Reply to thanks.
    Thanks,
    /// Capabilities.
    Help,
    /// Who the assistant is.
    Identity,
    /// A note was saved.
    NoteSaved,
    /// A reminder was scheduled.
    ReminderSet,
    /// A reminder without a time or a subject.
    ReminderUnclear,
    /// Saved notes were listed.
    NoteList,
    /// Pending reminders were listed.
    ReminderList,
    /// Nothing to list.
    ListingEmpty,
    /// A correction was applied.
    Correction,
    /// A correction with nothing to correct.
    CorrectionUnclear,
    /// Reply to "yes".
    Confirmation,
    /// Reply to "no".
    Negation,
    /// Conversational filler.
    Filler,
    /// In-character failure.
    Apology,
}

impl ResponseCategory {
    /// Whether a response in this category served the request.
    #[must_use]
    pub fn is_helpful(self) -> bool {
        !matches!(
            self,
            Self::Clarify
                | Self::RecallMissing
                | Self::CalculationFailed
                | Self::WeatherUnavailable
                | Self::CorrectionUnclear
                | Self::ReminderUnclear
                | Self::Apology
        )
    }
}

/// Pool for a category, honouring tone where the category has tone variants.
#[must_use]
pub fn pool(category: ResponseCategory, tone: Tone) -> &'static [&'static str] {
    use ResponseCategory as C;
    match (category, tone) {
        (C::Greeting, Tone::Formal) => GREETING_FORMAL,
        (C::Greeting, Tone::Casual) => GREETING_CASUAL,
        (C::Greeting, Tone::Enthusiastic) => GREETING_ENTHUSIASTIC,
        (C::Farewell, Tone::Formal) => FAREWELL_FORMAL,
        (C::Farewell, Tone::Casual) => FAREWELL_CASUAL,
        (C::Farewell, Tone::Enthusiastic) => FAREWELL_ENTHUSIASTIC,
        (C::MemoryStore, Tone::Formal) => STORE_FORMAL,
        (C::MemoryStore, Tone::Casual) => STORE_CASUAL,
        (C::MemoryStore, Tone::Enthusiastic) => STORE_ENTHUSIASTIC,
        (C::Thanks, Tone::Formal) => THANKS_FORMAL,
        (C::Thanks, Tone::Casual | Tone::Enthusiastic) => THANKS_CASUAL,
        (C::MemoryRecall, _) => RECALL,
        (C::RecallMissing, _) => RECALL_MISSING,
        (C::KnowledgeAnswer, _) => KNOWLEDGE_ANSWER,
        (C::MemoryAnswer, _) => MEMORY_ANSWER,
        (C::Clarify, _) => CLARIFY,
        (C::Calculation, _) => CALCULATION,
        (C::CalculationFailed, _) => CALCULATION_FAILED,
        (C::Time, _) => TIME,
        (C::Date, _) => DATE,
        (C::Weather, _) => WEATHER,
        (C::WeatherUnavailable, _) => WEATHER_UNAVAILABLE,
        (C::Joke, _) => JOKES,
        (C::Help, _) => HELP,
        (C::Identity, _) => IDENTITY,
        (C::NoteSaved, _) => NOTE_SAVED,
        (C::ReminderSet, _) => REMINDER_SET,
        (C::ReminderUnclear, _) => REMINDER_UNCLEAR,
        (C::NoteList, _) => NOTE_LIST,
        (C::ReminderList, _) => REMINDER_LIST,
        (C::ListingEmpty, _) => LISTING_EMPTY,
        (C::Correction, _) => CORRECTION,
        (C::CorrectionUnclear, _) => CORRECTION_UNCLEAR,
        (C::Confirmation, _) => CONFIRMATION,
        (C::Negation, _) => NEGATION,
        (C::Filler, _) => FILLER_ONGOING,
        (C::Apology, _) => APOLOGY,
    }
}

/// Filler used before the conversation has any history.
pub const FILLER_FIRST_TURN: &[&str] = &[
    "I'm listening. What would you like to do?",
    "How can I help you today?",
    "I'm here. What do you need?",
    "Ready when you are.",
    "What can I do for you?",
];

const FILLER_ONGOING: &[&str] = &[
    "Understood.",
    "I see. Anything else?",
    "Alright, noted.",
    "Of course. What next?",
    "Go on, I'm following.",
];

const GREETING_FORMAL: &[&str] = &[
    "{time}, {name}. How may I be of service?",
    "{time}, {name}. JARVIS at your service.",
    "Greetings, {name}. What can I do for you today?",
    "Hello, {name}. It's a pleasure to assist you.",
    "Welcome back, {name}. How may I help?",
];

const GREETING_CASUAL: &[&str] = &[
    "{time}, {name}! What's up?",
    "Hey {name}, good to see you. What can I do for you?",
    "Hi {name}! Ready when you are.",
    "Hello there, {name}. What are we working on?",
    "{time}! Nice to hear from you, {name}.",
];

const GREETING_ENTHUSIASTIC: &[&str] = &[
    "{time}, {name}! Wonderful to see you!",
    "Hello {name}! I was hoping you'd drop by!",
    "Hey {name}! Great to have you back!",
    "Welcome back, {name}! What shall we tackle today?",
    "{time}, {name}! I'm all charged up and ready!",
];

const FAREWELL_FORMAL: &[&str] = &[
    "Goodbye, {name}. It was a pleasure assisting you.",
    "Until next time, {name}.",
    "Farewell, {name}. I'll be here when you need me.",
    "It was an honor to serve you, {name}.",
    "Very good, {name}. Enjoy the rest of your {period}.",
];

const FAREWELL_CASUAL: &[&str] = &[
    "See you later, {name}!",
    "Bye for now, {name}.",
    "Catch you later, {name}.",
    "Take care, {name}!",
    "Talk soon, {name}. Enjoy your {period}.",
];

const FAREWELL_ENTHUSIASTIC: &[&str] = &[
    "Bye {name}! This was fun!",
    "See you soon, {name}! Have an amazing {period}!",
    "Take care, {name}! Come back anytime!",
    "Until next time, {name}! Stay awesome!",
    "Goodbye {name}! I'll be right here!",
];

const STORE_FORMAL: &[&str] = &[
    "Noted. Your {topic} is {value}.",
    "Understood. I'll remember that your {topic} is {value}.",
    "Very well. I have recorded your {topic} as {value}.",
    "I have stored your {topic}: {value}.",
    "Committed to memory: your {topic} is {value}.",
];

const STORE_CASUAL: &[&str] = &[
    "Got it, your {topic} is {value}.",
    "Okay, I'll remember your {topic} is {value}.",
    "Noted! {value} it is for your {topic}.",
    "Sure thing. Your {topic}: {value}.",
    "All right, saved your {topic} as {value}.",
];

const STORE_ENTHUSIASTIC: &[&str] = &[
    "Got it! Your {topic} is {value}!",
    "Love it! I'll remember your {topic} is {value}!",
    "{value}! Great choice for your {topic}. Saved!",
    "Done! Your {topic} is locked in as {value}!",
    "Noted with pleasure! Your {topic}: {value}!",
];

const THANKS_FORMAL: &[&str] = &[
    "You're most welcome.",
    "My pleasure, {name}.",
    "At your service always.",
    "Glad I could assist.",
    "It is no trouble at all, {name}.",
];

const THANKS_CASUAL: &[&str] = &[
    "You're welcome!",
    "Anytime, {name}!",
    "Happy to help anytime.",
    "No problem at all.",
    "Glad I could help, {name}!",
];

const RECALL: &[&str] = &[
    "Your {topic} is {value} ({percent}% confidence).",
    "I have your {topic} as {value}, with {percent}% confidence.",
    "As far as I recall, your {topic} is {value}. Confidence: {percent}%.",
    "{value}. That's what I have for your {topic}, {percent}% sure.",
    "You told me your {topic} is {value}. I'm {percent}% confident in that.",
];

const RECALL_MISSING: &[&str] = &[
    "I don't know your {topic} yet. Want to tell me?",
    "I don't have anything on your {topic}. Would you like me to remember it?",
    "Your {topic} hasn't come up yet. What is it?",
    "I'm afraid I don't know your {topic}. Care to share?",
    "No record of your {topic} so far. Tell me and I'll remember.",
];

const KNOWLEDGE_ANSWER: &[&str] = &[
    "Here's what I found: {knowledge}",
    "According to my sources: {knowledge}",
    "This is what I have: {knowledge}",
    "From what I can find: {knowledge}",
    "Here you go: {knowledge}",
];

const MEMORY_ANSWER: &[&str] = &[
    "Based on what I know, {topic} is {value} ({percent}% confidence).",
    "From memory: {topic} is {value}. I'm {percent}% sure.",
    "I recall that {topic} is {value}, with {percent}% confidence.",
    "My notes say {topic} is {value} ({percent}% confidence).",
    "If memory serves, {topic} is {value}. Confidence: {percent}%.",
];

/// Clarifying fallback for anything not understood.
pub const CLARIFY: &[&str] = &[
    "I didn't quite catch that. Could you rephrase?",
    "I'm not sure I understand. Could you clarify?",
    "My apologies, I didn't comprehend that request.",
    "Could you provide more details? I want to help.",
    "I'm still learning. Could you explain that differently?",
];

const CALCULATION: &[&str] = &[
    "The result of {expr} is {result}.",
    "{expr} equals {result}.",
    "That comes to {result}.",
    "By my calculation, {expr} is {result}.",
    "The answer is {result}.",
];

const CALCULATION_FAILED: &[&str] = &[
    "I couldn't calculate that. Please provide a valid mathematical expression.",
    "That expression doesn't compute, I'm afraid.",
    "I couldn't make sense of that calculation.",
    "Something about that expression doesn't add up. Try rephrasing it?",
    "I wasn't able to evaluate that. Check the numbers and operators?",
];

const TIME: &[&str] = &[
    "The current time is {clock}.",
    "It's {clock}.",
    "Right now it's {clock}.",
    "The clock reads {clock}.",
    "It is currently {clock}.",
];

const DATE: &[&str] = &[
    "Today is {date}.",
    "It's {date}.",
    "The date is {date}.",
    "We're on {date}.",
    "According to my calendar, it's {date}.",
];

const WEATHER: &[&str] = &[
    "Here's the weather{location}: {knowledge}",
    "Current conditions{location}: {knowledge}",
    "The forecast{location}: {knowledge}",
    "Weather update{location}: {knowledge}",
    "Looking outside{location}: {knowledge}",
];

const WEATHER_UNAVAILABLE: &[&str] = &[
    "Weather services are not configured. Please add a weather source in settings.",
    "I don't have a weather source configured yet.",
    "I can't reach any weather service at the moment.",
    "Weather data isn't available right now. A weather source needs to be configured.",
    "I'm afraid I have no window to look out of. Weather isn't configured.",
];

const JOKES: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything!",
    "I told my computer I needed a break, and now it won't stop sending me Kit-Kats.",
    "Why did the scarecrow win an award? He was outstanding in his field!",
    "I'm reading a book on anti-gravity. It's impossible to put down!",
    "Why don't eggs tell jokes? They'd crack each other up!",
    "I would tell you a construction joke, but I'm still working on it.",
    "Why did the bicycle fall over? Because it was two-tired!",
    "I'm friends with all electricians. We have good current connections.",
    "Why do programmers prefer dark mode? Because light attracts bugs!",
    "I told my wife she was drawing her eyebrows too high. She looked surprised!",
];

const HELP: &[&str] = &[
    "I can remember facts about you, keep notes, set reminders, answer questions, do calculations, tell the time and date, check the weather, and tell jokes.",
    "My capabilities include: remembering what you tell me, recalling it later, calculations, time and date, weather, and conversation.",
    "Try \"remember my favorite color is blue\", \"what is 12 times 7\", or \"what time is it\". I'll take it from there.",
    "Try \"remind me to call mom at 5 pm\" or \"remember to buy milk\", then ask \"what are my reminders\" or \"what are my notes\".",
    "Ask me to remember something, ask me what I know, or give me some arithmetic. I'm at your disposal.",
];

const IDENTITY: &[&str] = &[
    "I am J.A.R.V.I.S., Just A Rather Very Intelligent System. Your personal AI assistant.",
    "I'm JARVIS, your personal assistant.",
    "The name is JARVIS. I keep track of things so you don't have to.",
    "I'm JARVIS, an assistant that runs entirely on your machine.",
    "JARVIS, at your service. Think of me as a very organised notebook that talks back.",
];

const NOTE_SAVED: &[&str] = &[
    "Noted: {note}.",
    "Got it. I've written down: {note}.",
    "Saved to your notes: {note}.",
    "I'll keep a note of that: {note}.",
    "Added to your notes: {note}.",
];

const REMINDER_SET: &[&str] = &[
    "Reminder set: {task}, {when}.",
    "I'll remind you {when}: {task}.",
    "Okay, {when} I'll remind you: {task}.",
    "Consider it scheduled. {task}, {when}.",
    "Got it. I'll bring up \"{task}\" {when}.",
];

const REMINDER_UNCLEAR: &[&str] = &[
    "When should I remind you, and about what?",
    "I can set that reminder. What time, and what for?",
    "I didn't catch the time or the task. Try \"remind me to call mom at 5 pm\".",
    "Happy to remind you. Tell me what and when.",
    "I need both a task and a time for a reminder.",
];

const NOTE_LIST: &[&str] = &[
    "You have {count}: {items}.",
    "Here are your notes: {items}.",
    "I'm holding {count} for you: {items}.",
    "Your notes, oldest first: {items}.",
    "{count} on file: {items}.",
];

const REMINDER_LIST: &[&str] = &[
    "You have {count}: {items}.",
    "Coming up: {items}.",
    "{count} pending: {items}.",
    "Here's what I'll remind you about: {items}.",
    "Your reminders, soonest first: {items}.",
];

const LISTING_EMPTY: &[&str] = &[
    "You don't have any {kind} yet.",
    "No {kind} at the moment.",
    "Your {kind} are empty.",
    "I'm not holding any {kind} for you.",
    "Nothing in your {kind} right now.",
];

const CORRECTION: &[&str] = &[
    "My mistake. I've updated your {topic} to {value}.",
    "Got it, your {topic} is {value}, not what I had before.",
    "Corrected: your {topic} is now {value}.",
    "Thanks for the correction. {value} it is for your {topic}.",
    "Understood, I've changed your {topic} to {value}.",
];

const CORRECTION_UNCLEAR: &[&str] = &[
    "Apologies. What should it be instead?",
    "Sorry about that. What would you like me to change?",
    "My mistake. Could you tell me the correct value?",
    "Let's fix that. What's the right answer?",
    "I'm happy to correct it. What should I remember instead?",
];

const CONFIRMATION: &[&str] = &[
    "Very good.",
    "Excellent. Consider it done.",
    "Great, glad we agree.",
    "Affirmative.",
    "Perfect. Anything else?",
];

const NEGATION: &[&str] = &[
    "No problem.",
    "Understood, I'll leave it there.",
    "Alright, never mind then.",
    "As you wish.",
    "Okay. Let me know if you change your mind.",
];

const APOLOGY: &[&str] = &[
    "I'm terribly sorry, something went wrong on my end. Could you try that again?",
    "My apologies, I ran into a problem handling that.",
    "Forgive me, I wasn't able to complete that request.",
    "Something went awry on my side. Please try again in a moment.",
    "I'm afraid I encountered an error. Let's try that once more.",
];
